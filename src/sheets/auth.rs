use crate::error::{AppError, Result};
use crate::sheets::client::AUTH_SCOPES;
use hyper_util::client::legacy::connect::HttpConnector;
use std::path::Path;
use yup_oauth2::{
    ServiceAccountAuthenticator, authenticator::Authenticator, hyper_rustls::HttpsConnector,
    read_service_account_key,
};

pub(super) type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

/// Create and verify authenticator by fetching a token
pub(super) async fn create_and_verify_authenticator(key_file: &Path) -> Result<AuthType> {
    let key = read_service_account_key(key_file).await.map_err(|e| {
        AppError::Auth(format!(
            "Failed to read service account key {:?}: {}",
            key_file, e
        ))
    })?;

    let auth = ServiceAccountAuthenticator::builder(key)
        .build()
        .await
        .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))?;

    // Trigger authentication by requesting a token
    let _token = auth
        .token(&AUTH_SCOPES)
        .await
        .map_err(|e| AppError::Auth(format!("Failed to get token: {}", e)))?;

    Ok(auth)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_key_file() {
        let result = create_and_verify_authenticator(Path::new("does-not-exist.json")).await;
        let err = match result {
            Ok(_) => panic!("expected an error"),
            Err(e) => e,
        };

        assert!(matches!(err, AppError::Auth(_)));
    }
}
