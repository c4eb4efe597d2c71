use arena_rating::database::db::DbClient;
use lazy_static::lazy_static;
use std::sync::Arc;
use testcontainers::{clients::Cli, Container};
use testcontainers_modules::postgres::Postgres;
use tokio_postgres::{Client, NoTls};

pub struct TestDatabase {
    pub connection_string: String,
    _container: Container<'static, Postgres>
}

impl TestDatabase {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        // Create a static CLI instance
        lazy_static! {
            static ref DOCKER: Arc<Cli> = Arc::new(Cli::default());
        }

        // Start PostgreSQL container
        let container = DOCKER.run(Postgres::default());
        let port = container.get_host_port_ipv4(5432);

        let connection_string = format!(
            "host=localhost port={} user=postgres password=postgres dbname=postgres",
            port
        );

        // Create the schema through the same path the binary uses
        let client = DbClient::connect(&connection_string).await?;
        client.migrate().await?;

        Ok(TestDatabase {
            connection_string,
            _container: container
        })
    }

    pub async fn db_client(&self) -> Result<DbClient, Box<dyn std::error::Error>> {
        Ok(DbClient::connect(&self.connection_string).await?)
    }

    /// A raw connection for inspecting tables directly
    pub async fn get_client(&self) -> Result<Client, Box<dyn std::error::Error>> {
        let (client, connection) = tokio_postgres::connect(&self.connection_string, NoTls).await?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                eprintln!("Database connection error: {}", e);
            }
        });

        Ok(client)
    }

    /// Inserts a battle row with an explicit timestamp, bypassing the store
    pub async fn insert_battle_at(
        &self,
        model_a: &str,
        model_b: &str,
        winner: &str,
        created_at: &str
    ) -> Result<(), Box<dyn std::error::Error>> {
        let client = self.get_client().await?;

        client
            .execute(
                "INSERT INTO battles (category, model_a, model_b, winner, created_at) \
                 VALUES ('summarization', $1, $2, $3, $4::TEXT::TIMESTAMPTZ)",
                &[&model_a, &model_b, &winner, &created_at]
            )
            .await?;

        Ok(())
    }
}
