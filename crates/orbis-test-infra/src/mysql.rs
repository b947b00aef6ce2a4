use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const IMAGE: &str = "mysql";
const PORT: u16 = 3306;

/// Settings of the disposable catalog database.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "orbis".to_string(), setter(into))]
    database: String,
    #[builder(default = "orbis".to_string(), setter(into))]
    username: String,
    #[builder(default = "orbis".to_string(), setter(into))]
    password: String,
    #[builder(default = "8.4".to_string(), setter(into))]
    tag: String,
    /// Server default collation. The `countries` table pins its own, so this
    /// only matters for tables created outside the catalog DDL.
    #[builder(default = "utf8mb4_0900_as_ci".to_string(), setter(into))]
    collation: String,
}

/// Host and mapped port of a running server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

/// A MySQL container holding an empty catalog database.
///
/// The container is removed when this value is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    pub async fn start(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new(IMAGE, config.tag.as_str())
            .with_exposed_port(PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .with_cmd([
                "--character-set-server=utf8mb4".to_string(),
                format!("--collation-server={}", config.collation),
            ])
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn endpoint(&self) -> Result<Endpoint> {
        Ok(Endpoint {
            host: self.container.get_host().await?.to_string(),
            port: self.container.get_host_port_ipv4(PORT).await?,
        })
    }

    /// `mysql://` URL for the catalog database, as accepted by `sqlx`.
    ///
    /// The server may still be finishing its first-boot initialisation when
    /// this returns; callers should retry their first connection.
    pub async fn database_url(&self) -> Result<String> {
        let Endpoint { host, port } = self.endpoint().await?;
        Ok(format!(
            "mysql://{}:{}@{host}:{port}/{}",
            self.config.username, self.config.password, self.config.database
        ))
    }
}
