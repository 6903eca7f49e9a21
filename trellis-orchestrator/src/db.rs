use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    // Create pipeline configurations table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_configs (
            id UUID PRIMARY KEY,
            data_project_id UUID NOT NULL,
            project_handle VARCHAR(255) NOT NULL,
            name VARCHAR(255) NOT NULL,
            branch_prefix VARCHAR(255) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create pipeline instances table. The unique constraint on
    // (pipeline_config_id, number) is what makes duplicate instance numbers
    // structurally impossible under concurrent creation; the numbering
    // service retries on conflict.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS pipeline_instances (
            id UUID PRIMARY KEY,
            pipeline_config_id UUID NOT NULL REFERENCES pipeline_configs(id) ON DELETE RESTRICT,
            number INTEGER NOT NULL,
            target_branch VARCHAR(255) NOT NULL,
            status VARCHAR(50) NOT NULL,
            external_run_id VARCHAR(255),
            secret VARCHAR(255),
            created_at TIMESTAMPTZ NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL,
            CONSTRAINT uq_pipeline_instances_config_number UNIQUE (pipeline_config_id, number)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Create indexes for better query performance
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_instances_config_id ON pipeline_instances(pipeline_config_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_instances_status ON pipeline_instances(status)")
        .execute(pool)
        .await?;

    tracing::info!("Database migrations completed successfully");
    Ok(())
}
