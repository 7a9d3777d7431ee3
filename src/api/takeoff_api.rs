// ==========================================
// 工程量计算引擎 - 工程量与供应 API
// ==========================================
// 职责: 仓储 → 引擎 → 持久化 的薄封装
// 红线: 不含计算逻辑,计算全部委托引擎
// 并发: 同一台账的读-改-写通过 sync_lock 串行化
// ==========================================

use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, TakeoffConfigReader};
use crate::domain::boq::BoqSnapshot;
use crate::domain::supply::{SupplyKey, SupplySummary, SupplyTrackingItem};
use crate::domain::types::CompletionStatus;
use crate::engine::{
    BoqResult, QuantityTakeoffAggregator, SupplyReconciler, UnattributedDeliveryWarning,
};
use crate::repository::{
    AreaRuleRepository, BoqSnapshotRepository, DeliveryRepository, FloorRepository,
    SupplyTrackingRepository, UnitTemplateRepository,
};

// ==========================================
// 响应类型
// ==========================================

/// 计算结果（已落库快照）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResponse {
    pub snapshot_id: String,
    pub calculated_at: DateTime<Utc>,
    pub boq: BoqResult,
}

/// BOQ 同步台账结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplySyncResponse {
    pub inserted_count: usize,
    pub updated_count: usize,
    pub stale_keys: Vec<SupplyKey>,
    pub rule_error_count: usize,
    pub ledger: Vec<SupplyTrackingItem>,
    pub summary: SupplySummary,
}

/// 到货对账结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliverySyncResponse {
    pub delivered_line_count: usize,
    pub attributed_count: usize,
    pub unattributed_count: usize,
    pub unattributed: Vec<UnattributedDeliveryWarning>,
    pub ledger: Vec<SupplyTrackingItem>,
    pub summary: SupplySummary,
}

/// 台账报表行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyReportItem {
    #[serde(flatten)]
    pub item: SupplyTrackingItem,
    pub completion_percentage: f64,
    pub remaining_quantity: f64,
    pub status: CompletionStatus,
}

/// 台账报表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplyReport {
    pub project_id: i64,
    pub items: Vec<SupplyReportItem>,
    pub summary: SupplySummary,
}

// ==========================================
// BuildingQuantityApi
// ==========================================

/// 工程量与供应 API
///
/// 职责：
/// 1. calculate: 计算工程量清单并落库快照
/// 2. sync_supply: 按最新清单同步供应台账
/// 3. sync_supply_from_delivery: 按到货数据重算已收数量
/// 4. supply_report: 台账完成率报表
pub struct BuildingQuantityApi {
    floor_repo: Arc<FloorRepository>,
    template_repo: Arc<UnitTemplateRepository>,
    area_rule_repo: Arc<AreaRuleRepository>,
    supply_repo: Arc<SupplyTrackingRepository>,
    delivery_repo: Arc<DeliveryRepository>,
    boq_repo: Arc<BoqSnapshotRepository>,
    config_manager: Arc<ConfigManager>,
    reconciler: SupplyReconciler,
    sync_lock: Mutex<()>,
}

impl BuildingQuantityApi {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        floor_repo: Arc<FloorRepository>,
        template_repo: Arc<UnitTemplateRepository>,
        area_rule_repo: Arc<AreaRuleRepository>,
        supply_repo: Arc<SupplyTrackingRepository>,
        delivery_repo: Arc<DeliveryRepository>,
        boq_repo: Arc<BoqSnapshotRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            floor_repo,
            template_repo,
            area_rule_repo,
            supply_repo,
            delivery_repo,
            boq_repo,
            config_manager,
            reconciler: SupplyReconciler::new(),
            sync_lock: Mutex::new(()),
        }
    }

    /// 基于共享连接创建全部仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        Ok(Self::new(
            Arc::new(FloorRepository::from_connection(conn.clone())),
            Arc::new(UnitTemplateRepository::from_connection(conn.clone())),
            Arc::new(AreaRuleRepository::from_connection(conn.clone())),
            Arc::new(SupplyTrackingRepository::from_connection(conn.clone())),
            Arc::new(DeliveryRepository::from_connection(conn.clone())),
            Arc::new(BoqSnapshotRepository::from_connection(conn)),
            Arc::new(config_manager),
        ))
    }

    fn lock_ledger(&self) -> ApiResult<MutexGuard<'_, ()>> {
        self.sync_lock
            .lock()
            .map_err(|e| ApiError::InternalError(format!("台账锁获取失败: {}", e)))
    }

    /// 读取项目数据并计算清单（不落库）
    fn compute_boq(&self, project_id: i64) -> ApiResult<BoqResult> {
        let default_steel_factor = self
            .config_manager
            .default_steel_factor(project_id)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let floors = self.floor_repo.find_by_project(project_id)?;
        let templates = self.template_repo.find_by_project(project_id)?;
        let rules = self.area_rule_repo.find_by_project(project_id)?;

        let aggregator = QuantityTakeoffAggregator::new(default_steel_factor);
        let boq = aggregator.compute_boq(&floors, &templates, &rules)?;

        for error in &boq.errors {
            warn!(project_id, rule_id = error.rule_id, error = %error, "面积规则配置错误，已跳过");
        }
        Ok(boq)
    }

    // ==========================================
    // 计算接口
    // ==========================================

    /// 计算工程量清单并替换项目快照
    ///
    /// # 返回
    /// - Ok(CalculationResponse): 清单 + 快照 id（可能含规则级错误）
    /// - Err(ApiError::InputValidationError): 存在负面积/负户数
    pub fn calculate(&self, project_id: i64) -> ApiResult<CalculationResponse> {
        let boq = self.compute_boq(project_id)?;

        let config_snapshot = match self.config_manager.get_config_snapshot(project_id) {
            Ok(json) => Some(json),
            Err(e) => {
                warn!(project_id, error = %e, "配置快照获取失败，快照不含配置");
                None
            }
        };

        let lines: Vec<_> = boq.lines().cloned().collect();
        let snapshot = self.boq_repo.replace_snapshot(
            project_id,
            &lines,
            boq.total_cost(),
            boq.errors.len() as i64,
            config_snapshot,
        )?;

        info!(
            project_id,
            snapshot_id = %snapshot.snapshot_id,
            unit_lines = boq.unit_lines.len(),
            area_lines = boq.area_lines.len(),
            rule_errors = boq.errors.len(),
            total_cost = boq.total_cost(),
            "工程量清单计算完成"
        );

        Ok(CalculationResponse {
            snapshot_id: snapshot.snapshot_id,
            calculated_at: snapshot.calculated_at,
            boq,
        })
    }

    /// 查询项目最近一次清单快照
    pub fn latest_boq_snapshot(&self, project_id: i64) -> ApiResult<BoqSnapshot> {
        self.boq_repo
            .find_latest(project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("项目{}尚无清单快照", project_id)))
    }

    // ==========================================
    // 供应台账接口
    // ==========================================

    /// 按最新清单同步供应台账
    ///
    /// # 说明
    /// - 已收数量保留,需求数量/单价覆盖
    /// - 过期行不删除,在 stale_keys 中报告
    pub fn sync_supply(&self, project_id: i64) -> ApiResult<SupplySyncResponse> {
        let _guard = self.lock_ledger()?;

        let boq = self.compute_boq(project_id)?;
        let existing = self.supply_repo.find_by_project(project_id)?;

        let mut result = self.reconciler.sync_from_boq(project_id, &existing, &boq);
        self.supply_repo.save_ledger(&mut result.ledger)?;

        if !result.stale_keys.is_empty() {
            warn!(
                project_id,
                stale = result.stale_keys.len(),
                "台账中存在清单已不再需要的物料"
            );
        }
        info!(
            project_id,
            inserted = result.inserted_count,
            updated = result.updated_count,
            "供应台账同步完成"
        );

        let summary = self.reconciler.summarize(&result.ledger);
        Ok(SupplySyncResponse {
            inserted_count: result.inserted_count,
            updated_count: result.updated_count,
            stale_keys: result.stale_keys,
            rule_error_count: boq.errors.len(),
            ledger: result.ledger,
            summary,
        })
    }

    /// 按到货数据重算台账已收数量
    ///
    /// # 说明
    /// - 已收数量清零后按到货行累加
    /// - 未归属的到货行随结果返回供人工复核
    pub fn sync_supply_from_delivery(&self, project_id: i64) -> ApiResult<DeliverySyncResponse> {
        let _guard = self.lock_ledger()?;

        let statuses = self
            .config_manager
            .delivered_po_statuses(project_id)
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let delivered = self
            .delivery_repo
            .find_delivered_by_project(project_id, &statuses)?;
        let ledger = self.supply_repo.find_by_project(project_id)?;

        let mut result = self.reconciler.reconcile_deliveries(&ledger, &delivered);
        self.supply_repo.save_ledger(&mut result.ledger)?;

        for warning in &result.unattributed {
            warn!(project_id, warning = %warning, "到货行未能归属到台账");
        }
        info!(
            project_id,
            delivered = delivered.len(),
            attributed = result.attributed_count,
            unattributed = result.unattributed_count(),
            "到货对账完成"
        );

        let summary = self.reconciler.summarize(&result.ledger);
        Ok(DeliverySyncResponse {
            delivered_line_count: delivered.len(),
            attributed_count: result.attributed_count,
            unattributed_count: result.unattributed_count(),
            unattributed: result.unattributed,
            ledger: result.ledger,
            summary,
        })
    }

    /// 台账完成率报表
    pub fn supply_report(&self, project_id: i64) -> ApiResult<SupplyReport> {
        let ledger = self.supply_repo.find_by_project(project_id)?;
        let summary = self.reconciler.summarize(&ledger);

        let items = ledger
            .into_iter()
            .map(|item| SupplyReportItem {
                completion_percentage: item.completion_percentage(),
                remaining_quantity: item.remaining_quantity(),
                status: item.status(),
                item,
            })
            .collect();

        Ok(SupplyReport {
            project_id,
            items,
            summary,
        })
    }
}
