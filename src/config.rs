// src/config.rs

use std::{env, fmt::Display, str::FromStr, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    db::{ResidentRepository, RoomRepository, UserRepository},
    services::{
        auth::{AuthService, TokenKeys},
        resident_service::ResidentService,
        room_service::RoomService,
    },
};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub client_origin: String,
    pub admin_email: String,
    pub admin_password: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            port: try_load("PORT", "5000")?,
            client_origin: try_load("CLIENT_ORIGIN", "http://localhost:5173")?,
            admin_email: try_load("ADMIN_EMAIL", "admin@hostel.com")?,
            admin_password: try_load("ADMIN_PASSWORD", "admin123")?,
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "5")?,
        })
    }
}

fn required(key: &str) -> anyhow::Result<String> {
    env::var(key).with_context(|| format!("{key} deve ser definida"))
}

fn try_load<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        tracing::info!("{key} não definida, usando o padrão: {default}");
        default.to_string()
    });

    raw.parse()
        .map_err(|e| anyhow::anyhow!("Valor inválido para {key}: {e}"))
}

// O estado compartilhado que será acessível em toda a aplicação
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub auth_service: AuthService,
    pub room_service: RoomService,
    pub resident_service: ResidentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(config, db_pool))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(config: Config, db_pool: PgPool) -> Self {
        let auth_service = AuthService::new(
            UserRepository::new(db_pool.clone()),
            TokenKeys::new(config.jwt_secret.clone()),
            db_pool.clone(),
        );
        let room_service = RoomService::new(RoomRepository::new(db_pool.clone()), db_pool.clone());
        let resident_service = ResidentService::new(ResidentRepository::new(db_pool.clone()), db_pool.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            auth_service,
            room_service,
            resident_service,
        }
    }
}
