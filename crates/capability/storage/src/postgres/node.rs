//! Postgres 节点存储实现

use crate::error::StorageError;
use crate::traits::NodeStore;
use crate::validation::ensure_unique_components;
use domain::{ComponentDescriptor, NodeConfig, NodeId, TelemetrySample};
use sqlx::{PgPool, Row};

const SCHEMA: &str = include_str!("../../migrations/0001_node_data.sql");

pub struct PgNodeStore {
    pub pool: PgPool,
}

impl PgNodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }

    /// 创建缺失的表与索引
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl NodeStore for PgNodeStore {
    async fn node_exists(&self, node_id: &NodeId) -> Result<bool, StorageError> {
        let exists: bool = sqlx::query_scalar("select exists (select 1 from node where id = $1)")
            .bind(node_id.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn get_node_config(&self, node_id: &NodeId) -> Result<NodeConfig, StorageError> {
        // 每个测量类型取最新一次配置提交的单位；没有测量类型的组件也要出现在结果里。
        let rows = sqlx::query(
            "select c.id_used, s.measuring_unit \
             from component c \
             left join component_value_type v on v.component_id = c.id \
             left join lateral ( \
                 select cs.measuring_unit from component_settings cs \
                 join config_update u on u.id = cs.config_update_id \
                 where cs.component_value_type_id = v.id \
                 order by u.updated_at desc, cs.id desc \
                 limit 1 \
             ) s on true \
             where c.node_id = $1 \
             order by c.id_used, v.id",
        )
        .bind(node_id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut config = NodeConfig::new();
        for row in rows {
            let id_used: i64 = row.try_get("id_used")?;
            let unit: Option<String> = row.try_get("measuring_unit")?;
            let units = config.entry(id_used).or_default();
            if let Some(unit) = unit {
                units.push(unit);
            }
        }
        Ok(config)
    }

    async fn new_node_config(
        &self,
        node_id: &NodeId,
        components: &[ComponentDescriptor],
    ) -> Result<(), StorageError> {
        ensure_unique_components(components)?;
        let mut tx = self.pool.begin().await?;

        let config_update_id: i64 =
            sqlx::query_scalar("insert into config_update default values returning id")
                .fetch_one(&mut *tx)
                .await?;
        sqlx::query("insert into node (id) values ($1)")
            .bind(node_id.as_str())
            .execute(&mut *tx)
            .await?;

        for component in components {
            let component_id: i64 = sqlx::query_scalar(
                "insert into component (node_id, id_used, component_type, name) \
                 values ($1, $2, $3, $4) returning id",
            )
            .bind(node_id.as_str())
            .bind(component.id_used)
            .bind(&component.component_type)
            .bind(&component.name)
            .fetch_one(&mut *tx)
            .await?;

            for value_type in &component.value_types {
                let value_type_id: i64 = sqlx::query_scalar(
                    "insert into component_value_type (component_id, value_type) \
                     values ($1, $2) returning id",
                )
                .bind(component_id)
                .bind(&value_type.value_type)
                .fetch_one(&mut *tx)
                .await?;
                sqlx::query(
                    "insert into component_settings \
                     (component_value_type_id, config_update_id, measuring_unit, measurement_period) \
                     values ($1, $2, $3, $4)",
                )
                .bind(value_type_id)
                .bind(config_update_id)
                .bind(&value_type.measuring_unit)
                .bind(value_type.measurement_period)
                .execute(&mut *tx)
                .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn append_measurement(&self, sample: &TelemetrySample) -> Result<bool, StorageError> {
        let result = sqlx::query(
            "insert into measurement (component_settings_id, value, measured_at) \
             select cs.id, $4, to_timestamp($5 / 1000.0) \
             from component c \
             join component_value_type v on v.component_id = c.id \
             join component_settings cs on cs.component_value_type_id = v.id \
             where c.node_id = $1 and c.id_used = $2 and cs.measuring_unit = $3 \
             order by cs.id desc \
             limit 1",
        )
        .bind(sample.node_id.as_str())
        .bind(sample.component_id_used)
        .bind(&sample.measuring_unit)
        .bind(sample.value)
        .bind(sample.observed_at_ms as f64)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
