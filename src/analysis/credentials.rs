use std::env;

use serde::{Deserialize, Serialize};

use crate::analysis::error::{StageError, StageErrorKind, invalid_input};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CredentialRef {
    Env { var: String },
    InlineToken { token: String },
    None,
}

impl Default for CredentialRef {
    fn default() -> Self {
        CredentialRef::Env {
            var: "OPENAI_API_KEY".to_string(),
        }
    }
}

impl CredentialRef {
    /// Resolves to an `Authorization` header value, or `None` for unauthenticated backends.
    pub fn resolve_auth_header(&self) -> Result<Option<String>, StageError> {
        match self {
            CredentialRef::Env { var } => {
                let token = env::var(var).map_err(|_| {
                    StageError::new(
                        StageErrorKind::InvalidInput,
                        format!("missing credential environment variable {var}"),
                    )
                })?;
                if token.trim().is_empty() {
                    return Err(invalid_input(format!(
                        "credential environment variable {var} is empty"
                    )));
                }
                Ok(Some(format!("Bearer {token}")))
            }
            CredentialRef::InlineToken { token } => {
                if token.trim().is_empty() {
                    return Err(invalid_input("inline credential token cannot be empty"));
                }
                Ok(Some(format!("Bearer {token}")))
            }
            CredentialRef::None => Ok(None),
        }
    }
}
