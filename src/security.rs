use std::path::PathBuf;
use std::{env, fs};

const TOKEN_SECRET: &'static str = "token.secret";

/// Byte length of a generated HMAC signing secret.
const SECRET_LEN: usize = 64;

#[derive(Debug, Clone)]
pub struct Security {
    /// HS256 secret shared by auth cookies and invite tokens.
    pub jwt_secret: Vec<u8>,
}

#[inline]
fn security_dir() -> PathBuf {
    PathBuf::from(env::var("SECURITY_DIR").unwrap_or("./security".to_string()))
}

impl Security {
    pub fn load() -> Security {
        if let Ok(secret) = env::var("JWT_SECRET_KEY") {
            tracing::info!("Using JWT secret from environment.");
            return Security {
                jwt_secret: secret.into_bytes(),
            };
        }

        let dir = security_dir();

        if cfg!(feature = "generate-security") {
            fs::create_dir_all(dir.clone())
                .expect("unable to create directory for storing security information");
        }

        tracing::info!("Loading token signing secret...");
        let secret = fs::read(dir.join(TOKEN_SECRET)).ok();

        let jwt_secret = match secret {
            Some(it) => {
                tracing::info!("Token secret found and loaded.");
                it
            }
            #[cfg(feature = "generate-security")]
            None => {
                tracing::info!(
                    "Secret not found in '{}'. Generating a new one.",
                    dir.join(TOKEN_SECRET).display()
                );

                let generated: Vec<u8> = (0..SECRET_LEN).map(|_| rand::random::<u8>()).collect();

                fs::write(dir.join(TOKEN_SECRET), generated.as_slice())
                    .expect("unable to write token secret");

                generated
            }
            #[cfg(not(feature = "generate-security"))]
            None => {
                panic!("Unable to load token signing secret.");
            }
        };

        Security { jwt_secret }
    }
}
