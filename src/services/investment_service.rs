// src/services/investment_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{dates::add_months, db_utils::page_window, error::AppError},
    db::{
        investment_repo::NewInvestment, CommissionRepository, DebentureRepository,
        InvestmentRepository, RemuneracaoRepository, UserRepository,
    },
    models::{
        audit::{AuditAction, NewAuditEntry},
        auth::AuthContext,
        debenture::DebentureLifecycle,
        investment::{
            CreateInvestmentPayload, CreatedInvestment, Investment, InvestmentFilters,
            InvestmentPage, InvestmentStatus, Pagination,
        },
        user::Role,
    },
    services::{
        access::{require_global, AccessGate, Action},
        load_tree,
        schedule::{
            generate_remuneracoes, generate_schedule, validate_terms, CommissionSplit,
            RemuneracaoLabels, SeriesTerms,
        },
        AuditService,
    },
};

const RESOURCE: &str = "INVESTMENT";

#[derive(Clone)]
pub struct InvestmentService {
    investment_repo: InvestmentRepository,
    debenture_repo: DebentureRepository,
    commission_repo: CommissionRepository,
    remuneracao_repo: RemuneracaoRepository,
    user_repo: UserRepository,
    audit: AuditService,
    pool: PgPool,
}

impl InvestmentService {
    pub fn new(
        investment_repo: InvestmentRepository,
        debenture_repo: DebentureRepository,
        commission_repo: CommissionRepository,
        remuneracao_repo: RemuneracaoRepository,
        user_repo: UserRepository,
        audit: AuditService,
        pool: PgPool,
    ) -> Self {
        Self {
            investment_repo,
            debenture_repo,
            commission_repo,
            remuneracao_repo,
            user_repo,
            audit,
            pool,
        }
    }

    pub async fn list(&self, ctx: &AuthContext, filters: &InvestmentFilters) -> Result<InvestmentPage, AppError> {
        let tree = load_tree(&self.user_repo, &self.pool).await?;
        let visible = AccessGate::new(&tree).visible_users(ctx);

        let (limit, offset) = page_window(filters.page, filters.limit);
        let (investments, total) = self
            .investment_repo
            .list(visible.user_ids(), ctx.user_id, filters, limit, offset)
            .await?;

        Ok(InvestmentPage {
            investments,
            pagination: Pagination::new(offset / limit + 1, limit, total),
        })
    }

    /// Cria o investimento e todo o cronograma (comissões e remunerações) numa
    /// única transação. Qualquer falha desfaz tudo, inclusive a captação.
    pub async fn create(
        &self,
        ctx: &AuthContext,
        payload: CreateInvestmentPayload,
    ) -> Result<CreatedInvestment, AppError> {
        payload.validate()?;

        let tree = load_tree(&self.user_repo, &self.pool).await?;
        AccessGate::new(&tree).ensure(
            ctx,
            Action::CreateInvestment { investor_user_id: payload.investor_user_id },
        )?;

        let investor = self
            .user_repo
            .find_by_id(&self.pool, payload.investor_user_id)
            .await?
            .ok_or_else(|| AppError::not_found("Investidor"))?;
        if investor.role != Role::Investidor {
            return Err(AppError::rule("O usuário informado não é um Investidor."));
        }
        if !investor.is_active() {
            return Err(AppError::rule("O investidor está inativo."));
        }

        let superiors = tree.superiors_by_role(investor.id)?;
        let assessor_user_id = superiors.get(&Role::Assessor).copied().ok_or_else(|| {
            AppError::rule("O investidor não possui um Assessor na hierarquia.")
        })?;

        let mut tx = self.pool.begin().await?;

        let series = self.debenture_repo.lock_series(&mut *tx, payload.series_id).await?;
        let debenture = self.debenture_repo.find_debenture(&mut *tx, series.debenture_id).await?;
        let today = Utc::now().date_naive();
        if debenture.lifecycle(today) != DebentureLifecycle::Active {
            return Err(AppError::rule("A debênture desta série está vencida."));
        }

        let split = CommissionSplit {
            master: payload.commission_master,
            escritorio: payload.commission_escritorio,
            assessor: payload.commission_assessor,
            global: payload.commission_global,
        };
        let terms = SeriesTerms::from(&series);
        validate_terms(payload.invested_amount, &split, &terms)?;

        let investment_date = payload.investment_date.unwrap_or(today);
        let new = NewInvestment {
            series_id: series.id,
            investor_user_id: investor.id,
            assessor_user_id,
            escritorio_user_id: superiors.get(&Role::Escritorio).copied(),
            master_user_id: superiors.get(&Role::Master).copied(),
            global_user_id: superiors.get(&Role::Global).copied(),
            invested_amount: payload.invested_amount,
            investment_date,
            maturity_date: add_months(investment_date, terms.duration_months),
            interest_rate: terms.interest_rate,
            interest_type: payload.interest_type.unwrap_or(terms.interest_type),
            commission_master: split.master,
            commission_escritorio: split.escritorio,
            commission_assessor: split.assessor,
            commission_global: split.global,
        };

        let investment = self.investment_repo.create(&mut *tx, &new).await?;
        self.debenture_repo
            .add_captation(&mut *tx, series.id, investment.invested_amount)
            .await?;

        let commissions = generate_schedule(&investment, terms.duration_months)?;
        let labels = RemuneracaoLabels {
            investor_name: investor.full_name.clone(),
            investor_pix: investor.pix.clone(),
            debenture_name: debenture.name.clone(),
            series_code: series.series_code.clone(),
        };
        let remuneracoes = generate_remuneracoes(&investment, terms.duration_months, &labels);

        let commissions_created = self.commission_repo.insert_many(&mut *tx, &commissions).await?;
        let remuneracoes_created = self.remuneracao_repo.insert_many(&mut *tx, &remuneracoes).await?;

        tx.commit().await?;

        tracing::info!(
            "✅ Investimento {} criado: {} comissões, {} remunerações",
            investment.id,
            commissions_created,
            remuneracoes_created
        );
        self.audit
            .record(
                NewAuditEntry::new(
                    ctx.user_id,
                    AuditAction::Create,
                    RESOURCE,
                    format!("Investimento criado com {} parcelas", terms.duration_months),
                )
                .resource(investment.id, format!("{} - {}", investor.full_name, series.series_code))
                .new_values(serde_json::to_value(&investment).unwrap_or_default()),
            )
            .await;

        Ok(CreatedInvestment { investment, commissions_created, remuneracoes_created })
    }

    pub async fn update_status(
        &self,
        ctx: &AuthContext,
        id: Uuid,
        status: InvestmentStatus,
    ) -> Result<Investment, AppError> {
        require_global(ctx, Action::ManageInvestment)?;

        let mut tx = self.pool.begin().await?;
        let current = self.investment_repo.find(&mut *tx, id).await?;
        let updated = self.investment_repo.update_status(&mut *tx, id, status).await?;
        tx.commit().await?;

        tracing::info!("🔄 Investimento {}: {:?} -> {:?}", id, current.status, updated.status);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Update, RESOURCE, "Status do investimento alterado")
                    .resource(id, id.to_string())
                    .old_values(serde_json::json!({ "status": current.status }))
                    .new_values(serde_json::json!({ "status": updated.status })),
            )
            .await;

        Ok(updated)
    }

    /// Remove o investimento com seus cronogramas e devolve a captação à
    /// série. Bloqueado quando alguma parcela já foi paga.
    pub async fn delete(&self, ctx: &AuthContext, id: Uuid) -> Result<(), AppError> {
        require_global(ctx, Action::ManageInvestment)?;

        let mut tx = self.pool.begin().await?;
        let investment = self.investment_repo.find(&mut *tx, id).await?;

        let paid = self.commission_repo.count_paid_for_investment(&mut *tx, id).await?
            + self.remuneracao_repo.count_paid_for_investment(&mut *tx, id).await?;
        if paid > 0 {
            return Err(AppError::Conflict(format!(
                "O investimento possui {} parcela(s) paga(s) e não pode ser excluído.",
                paid
            )));
        }

        self.investment_repo.delete(&mut *tx, id).await?;
        self.debenture_repo
            .add_captation(&mut *tx, investment.series_id, -investment.invested_amount)
            .await?;
        tx.commit().await?;

        tracing::info!("🗑️ Investimento {} excluído", id);
        self.audit
            .record(
                NewAuditEntry::new(ctx.user_id, AuditAction::Delete, RESOURCE, "Investimento excluído")
                    .resource(id, id.to_string())
                    .old_values(serde_json::to_value(&investment).unwrap_or_default()),
            )
            .await;

        Ok(())
    }
}
