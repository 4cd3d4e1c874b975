use crate::config::{AuthMethod, GoogleConfig};
use crate::error::{AppError, Result};
use crate::sheets::client::AUTH_SCOPE;
use hyper_util::client::legacy::connect::HttpConnector;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tracing::{debug, info, instrument};
use tracing_indicatif::suspend_tracing_indicatif;
use url::Url;
use yup_oauth2::authenticator_delegate::InstalledFlowDelegate;
use yup_oauth2::{
    ApplicationSecret, AuthorizedUserAuthenticator, InstalledFlowAuthenticator,
    InstalledFlowReturnMethod, ServiceAccountAuthenticator, authenticator::Authenticator,
    hyper_rustls::HttpsConnector,
};

pub(crate) type AuthType = Authenticator<HttpsConnector<HttpConnector>>;

const BANNER_WIDTH: usize = 70;

/// Create and verify authenticator by fetching a token
pub(super) async fn create_and_verify_authenticator(config: &GoogleConfig) -> Result<AuthType> {
    let auth = build_authenticator(config).await?;
    let token_cache_path = config.token_cache_path()?;

    // Trigger authentication by requesting a token
    let _token = auth.token(&[AUTH_SCOPE]).await.map_err(|e| {
        AppError::Auth(token_failure_message(
            &config.auth,
            &token_cache_path,
            &e.to_string(),
        ))
    })?;

    info!(path = ?token_cache_path, "Google Sheets authentication successful, credentials saved");

    Ok(auth)
}

fn token_failure_message(method: &AuthMethod, token_cache_path: &Path, cause: &str) -> String {
    let mut message = format!("Failed to get token: {}", cause);

    if let AuthMethod::LocalServer { port } = method {
        message.push_str(&format!(
            "\n\nPossible causes:\n\
             1. Port {port} is already in use on this host\n\
             2. SSH port forwarding is not set up\n\
             3. Authentication was cancelled in the browser\n\
             4. The client secret file is invalid\n\n\
             For SSH connections, reconnect with port forwarding:\n\
             \x20 ssh -L {port}:localhost:{port} user@server"
        ));
    }

    message.push_str(&format!(
        "\n\nIf a cached token could not be refreshed, delete it and re-authenticate:\n\
         \x20 rm {}",
        token_cache_path.display()
    ));

    message
}

async fn build_authenticator(config: &GoogleConfig) -> Result<AuthType> {
    let token_cache_path = prepare_token_cache(config)?;

    match &config.auth {
        AuthMethod::LocalServer { port } => {
            debug!(port, "Using installed flow with local redirect");
            from_installed_flow(
                config,
                InstalledFlowReturnMethod::HTTPPortRedirect(*port),
                ConsentDelegate::local_server(*port),
                token_cache_path,
            )
            .await
        }
        AuthMethod::Interactive => {
            debug!("Using installed flow with pasted authorization code");
            from_installed_flow(
                config,
                InstalledFlowReturnMethod::Interactive,
                ConsentDelegate::interactive(),
                token_cache_path,
            )
            .await
        }
        AuthMethod::ServiceAccount { key_file } => {
            debug!(path = ?key_file, "Using service account key");
            let key = yup_oauth2::read_service_account_key(key_file)
                .await
                .map_err(|e| {
                    AppError::Auth(format!(
                        "Failed to read service account key {:?}: {}",
                        key_file, e
                    ))
                })?;

            ServiceAccountAuthenticator::builder(key)
                .persist_tokens_to_disk(token_cache_path)
                .build()
                .await
                .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))
        }
        AuthMethod::AuthorizedUser { secret_file } => {
            debug!(path = ?secret_file, "Using cached authorized user credentials");
            let secret = yup_oauth2::read_authorized_user_secret(secret_file)
                .await
                .map_err(|e| {
                    AppError::Auth(format!(
                        "Failed to read authorized user secret {:?}: {}",
                        secret_file, e
                    ))
                })?;

            AuthorizedUserAuthenticator::builder(secret)
                .persist_tokens_to_disk(token_cache_path)
                .build()
                .await
                .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))
        }
    }
}

async fn from_installed_flow(
    config: &GoogleConfig,
    return_method: InstalledFlowReturnMethod,
    delegate: ConsentDelegate,
    token_cache_path: PathBuf,
) -> Result<AuthType> {
    let secret = read_client_secrets(&config.client_secrets_path()?).await?;

    // Tokens are reused from disk; the consent flow only runs when none are usable
    let auth = InstalledFlowAuthenticator::builder(secret, return_method)
        .persist_tokens_to_disk(token_cache_path)
        .flow_delegate(Box::new(delegate))
        .build()
        .await
        .map_err(|e| AppError::Auth(format!("Failed to build authenticator: {}", e)))?;

    Ok(auth)
}

async fn read_client_secrets(path: &Path) -> Result<ApplicationSecret> {
    if !path.exists() {
        return Err(AppError::Config(format!(
            "OAuth2 client secret not found at {:?}\n\n\
             To set up Google Sheets access:\n\
             1. Create an OAuth client ID (Desktop app) in the Google Cloud console\n\
             2. Download its JSON and save it as {:?}\n\
             3. Restrict permissions: chmod 600 {:?}",
            path, path, path
        )));
    }

    yup_oauth2::read_application_secret(path)
        .await
        .map_err(|e| AppError::Config(format!("Invalid client secret {:?}: {}", path, e)))
}

fn prepare_token_cache(config: &GoogleConfig) -> Result<PathBuf> {
    let token_cache_path = config.token_cache_path()?;

    // Create parent directory if it doesn't exist
    if let Some(parent) = token_cache_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Auth(format!("Failed to create token cache directory: {}", e))
        })?;
    }

    Ok(token_cache_path)
}

/// Clear cached Google tokens by deleting the token cache file
#[instrument(name = "Clearing auth tokens for Google Sheets", skip_all)]
pub fn clear_tokens(config: &GoogleConfig) -> Result<()> {
    let token_path = config.token_cache_path()?;

    if !token_path.exists() {
        debug!("No Google Sheets tokens to clear");
        return Ok(());
    }

    fs::remove_file(&token_path)
        .map_err(|e| AppError::Auth(format!("Failed to delete tokens file: {}", e)))?;
    info!(path = ?token_path, "Cleared Google Sheets cached tokens");

    Ok(())
}

/// Prints operator instructions before the consent URL is shown.
struct ConsentDelegate {
    port: Option<u16>,
    redirect_uri: Option<String>,
}

impl ConsentDelegate {
    fn local_server(port: u16) -> Self {
        Self {
            port: Some(port),
            redirect_uri: None,
        }
    }

    // Google no longer accepts the out-of-band redirect, so the code is copied
    // from the address bar of the (failed) localhost redirect instead.
    fn interactive() -> Self {
        Self {
            port: None,
            redirect_uri: Some(format!(
                "http://localhost:{}",
                crate::config::DEFAULT_REDIRECT_PORT
            )),
        }
    }

    async fn present(&self, url: &str, need_code: bool) -> std::result::Result<String, String> {
        let banner = consent_banner(self.port);
        let url = url.to_string();

        // Keep progress spinners from drawing over the instructions and prompt
        tokio::task::spawn_blocking(move || {
            suspend_tracing_indicatif(|| prompt_operator(&banner, &url, need_code))
        })
        .await
        .map_err(|e| e.to_string())?
    }
}

fn prompt_operator(
    banner: &str,
    url: &str,
    need_code: bool,
) -> std::result::Result<String, String> {
    println!("{}", banner);
    println!("Copy this URL and open it in your browser:\n\n{}\n", url);

    if !need_code {
        println!("Waiting for authentication...");
        return Ok(String::new());
    }

    println!("After granting access the browser fails to load a localhost page.");
    println!("Paste that page's full address (or just its `code` value) below.");

    let input = dialoguer::Input::<String>::new()
        .with_prompt("Authorization code")
        .interact_text()
        .map_err(|e| e.to_string())?;

    Ok(extract_code(&input))
}

impl InstalledFlowDelegate for ConsentDelegate {
    fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    fn present_user_url<'a>(
        &'a self,
        url: &'a str,
        need_code: bool,
    ) -> Pin<Box<dyn Future<Output = std::result::Result<String, String>> + Send + 'a>> {
        Box::pin(self.present(url, need_code))
    }
}

fn consent_banner(port: Option<u16>) -> String {
    let rule = "=".repeat(BANNER_WIDTH);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        "OAUTH2 AUTHENTICATION REQUIRED".to_string(),
        rule.clone(),
        String::new(),
    ];

    if let Some(port) = port {
        lines.extend([
            "SSH PORT FORWARDING REQUIRED when running on a remote host!".to_string(),
            "If not already done, reconnect with:".to_string(),
            format!("  ssh -L {port}:localhost:{port} user@server"),
            String::new(),
            "Open the URL below in your LOCAL browser.".to_string(),
            "After granting access, the browser redirects and auth completes.".to_string(),
            String::new(),
        ]);
    }

    lines.push(rule);
    lines.join("\n")
}

/// Accept either the bare code or the whole redirect URL it arrived on.
fn extract_code(input: &str) -> String {
    let input = input.trim();
    Url::parse(input)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(key, _)| key == "code")
                .map(|(_, value)| value.into_owned())
        })
        .unwrap_or_else(|| input.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_mentions_port_forwarding() {
        let banner = consent_banner(Some(8080));

        assert!(banner.contains("OAUTH2 AUTHENTICATION REQUIRED"));
        assert!(banner.contains("ssh -L 8080:localhost:8080 user@server"));
    }

    #[test]
    fn test_token_failure_hints_for_local_server() {
        let message = token_failure_message(
            &AuthMethod::LocalServer { port: 8080 },
            Path::new("/home/user/.config/gspread/token.json"),
            "connection reset",
        );

        assert!(message.contains("Failed to get token: connection reset"));
        assert!(message.contains("Port 8080 is already in use"));
        assert!(message.contains("ssh -L 8080:localhost:8080 user@server"));
        assert!(message.contains("rm /home/user/.config/gspread/token.json"));
    }

    #[test]
    fn test_token_failure_hints_for_service_account() {
        let message = token_failure_message(
            &AuthMethod::ServiceAccount {
                key_file: PathBuf::from("/etc/key.json"),
            },
            Path::new("/tmp/token.json"),
            "invalid_grant",
        );

        assert!(message.contains("invalid_grant"));
        assert!(!message.contains("ssh -L"));
        assert!(message.contains("rm /tmp/token.json"));
    }

    #[test]
    fn test_banner_without_port() {
        let banner = consent_banner(None);

        assert!(banner.contains("OAUTH2 AUTHENTICATION REQUIRED"));
        assert!(!banner.contains("ssh -L"));
    }

    #[test]
    fn test_extract_code_from_redirect_url() {
        let code = extract_code(
            "http://localhost:8080/?state=xyz&code=4/0AbCdEf&scope=https://www.googleapis.com/auth/spreadsheets.readonly",
        );
        assert_eq!(code, "4/0AbCdEf");
    }

    #[test]
    fn test_extract_code_bare() {
        assert_eq!(extract_code("  4/0AbCdEf\n"), "4/0AbCdEf");
    }

    #[test]
    fn test_interactive_delegate_redirects_to_localhost() {
        let delegate = ConsentDelegate::interactive();
        assert_eq!(delegate.redirect_uri(), Some("http://localhost:8080"));

        let delegate = ConsentDelegate::local_server(9000);
        assert_eq!(delegate.redirect_uri(), None);
    }

    #[test]
    fn test_clear_tokens_missing_file() {
        let config = GoogleConfig {
            token_cache: Some(std::env::temp_dir().join("gsheet-frame-missing-token.json")),
            ..Default::default()
        };

        assert!(clear_tokens(&config).is_ok());
    }

    #[test]
    fn test_clear_tokens_removes_file() {
        let path = std::env::temp_dir().join(format!(
            "gsheet-frame-token-{}.json",
            std::process::id()
        ));
        fs::write(&path, "[]").unwrap();
        let config = GoogleConfig {
            token_cache: Some(path.clone()),
            ..Default::default()
        };

        clear_tokens(&config).unwrap();

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_client_secrets() {
        let path = std::env::temp_dir().join("gsheet-frame-no-such-secrets.json");
        let result = read_client_secrets(&path).await;

        match result {
            Err(AppError::Config(message)) => assert!(message.contains("client secret not found")),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
