extern crate tracing_futures;

#[macro_use]
extern crate rocket;
#[macro_use]
extern crate serde;

use bson::doc;
use error::BackendError;
use mongodb::options::IndexOptions;
use mongodb::{Client, IndexModel};
use rocket::http::Method;
use rocket::Rocket;
use rocket_cors::{AllowedHeaders, AllowedOrigins};
use std::process::exit;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use crate::config::Config;
use crate::data::classroom::{Classroom, CLASSROOM_COLLECTION_NAME};
use crate::data::grade::{GradeStructure, GRADE_STRUCTURE_COLLECTION_NAME};
use crate::error::ConfigurationError;
use crate::mail::Mailer;
use crate::route::mount_api;
use crate::security::Security;

pub mod config;
pub mod data;
pub mod error;
pub mod invite;
pub mod mail;
pub mod resp;
pub mod role;
pub mod route;
pub mod security;

/// Unique indexes backstopping the check-then-insert windows of class-code
/// generation and grade-structure lazy creation.
async fn ensure_indexes(db: &mongodb::Database) -> Result<(), mongodb::error::Error> {
    let unique = IndexOptions::builder().unique(true).build();

    db.collection::<Classroom>(CLASSROOM_COLLECTION_NAME)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "class_code": 1 })
                .options(unique.clone())
                .build(),
            None,
        )
        .await?;

    db.collection::<GradeStructure>(GRADE_STRUCTURE_COLLECTION_NAME)
        .create_index(
            IndexModel::builder()
                .keys(doc! { "class_id": 1 })
                .options(unique)
                .build(),
            None,
        )
        .await?;

    Ok(())
}

pub async fn create(log_level: Option<Level>) -> Result<Rocket<rocket::Build>, BackendError> {
    if let Some(l) = log_level {
        let subscriber = FmtSubscriber::builder().with_max_level(l).finish();

        if let Err(err) = tracing::subscriber::set_global_default(subscriber) {
            eprintln!("Unable to set global logger: {}", err);
        };
    }

    tracing::info!("Reading .env file...");
    if dotenv::dotenv().is_err() {
        tracing::warn!("Unable to load .env file.");
    }

    tracing::info!("Loading configuration...");
    let c = match Config::load() {
        Ok(c) => {
            tracing::info!("Configuration loaded.");
            c
        }
        Err(ConfigurationError::NotFound(_)) => {
            let c = Config::default();
            if c.save().is_err() {
                tracing::warn!("Unable to save generated configuration.");
            }
            c
        }
        Err(other) => {
            tracing::error!("Configuration error: {}", other);
            return Err(other.into());
        }
    };

    tracing::info!("Loading security information...");
    let security = Security::load();

    tracing::info!("Configuring SMTP transport: {}", c.mail_host);
    let mailer = Mailer::from_config(&c)?;

    tracing::info!("Connecting to MongoDB: {}", c.mongodb_uri);
    let client = Client::with_uri_str(c.mongodb_uri.as_str())
        .await
        .expect("Unable to init MongoDB client! Is URI valid?");

    tracing::info!("Using MongoDB database: {}", c.mongodb_db);
    let db = client.database(c.mongodb_db.as_str());

    if db.list_collections(None, None).await.is_err() {
        tracing::error!("Unable to connect to MongoDB.");
        exit(1)
    }

    tracing::info!("Ensuring collection indexes...");
    ensure_indexes(&db).await?;

    tracing::info!("Starting HTTP server...");
    let mut r = rocket::build()
        .manage(c)
        .manage(db)
        .manage(security)
        .manage(mailer);

    tracing::info!("Setting up CORS...");
    let allowed_origins = AllowedOrigins::All;

    // You can also deserialize this
    let cors = rocket_cors::CorsOptions {
        allowed_origins,
        allowed_methods: vec![Method::Get, Method::Put, Method::Post, Method::Delete]
            .into_iter()
            .map(From::from)
            .collect(),
        allowed_headers: AllowedHeaders::All,
        allow_credentials: true,
        ..Default::default()
    }
    .to_cors()
    .expect("Unable to configure CORS.");

    r = r.attach(cors);
    r = mount_api(r);

    Ok(r)
}
