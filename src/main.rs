use chirpy_auth::api::*;
use chirpy_auth::application_port::*;
use chirpy_auth::domain_model::*;
use chirpy_auth::logger::*;
use chirpy_auth::server::*;
use chirpy_auth::settings::*;
use serde::Serialize;
use std::process::ExitCode;
use warp::http::{HeaderMap, HeaderValue, header::AUTHORIZATION};

#[derive(Serialize)]
#[serde(untagged)]
enum Output {
    Credential(CredentialRecord),
    Login(LoginResult),
    Access(IssuedAccessToken),
    User { user_id: UserId },
    Reset { deleted: u64 },
    Ok { ok: bool },
}

fn authorization_headers(value: &str) -> Result<HeaderMap, AuthError> {
    let value = HeaderValue::from_str(value).map_err(|_| AuthError::MissingCredential)?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, value);
    Ok(headers)
}

async fn run(server: &Server, command: Command) -> Result<Output, AuthError> {
    let manager = &server.session_manager;
    match command {
        Command::Register { email, password } => manager
            .register(RegisterInput { email, password })
            .await
            .map(Output::Credential),
        Command::Login { email, password } => manager
            .login(LoginInput { email, password })
            .await
            .map(Output::Login),
        Command::Refresh { authorization } => {
            let token = extract_bearer(&authorization_headers(&authorization)?)?;
            manager.refresh(&token).await.map(Output::Access)
        }
        Command::Revoke { authorization } => {
            let token = extract_bearer(&authorization_headers(&authorization)?)?;
            manager.revoke(&token).await?;
            Ok(Output::Ok { ok: true })
        }
        Command::ChangePassword {
            authorization,
            email,
            password,
        } => {
            let token = extract_bearer(&authorization_headers(&authorization)?)?;
            manager
                .change_password(
                    &token,
                    ChangePasswordInput {
                        new_email: email,
                        new_password: password,
                    },
                )
                .await
                .map(Output::Credential)
        }
        Command::Authenticate { authorization } => {
            let token = extract_bearer(&authorization_headers(&authorization)?)?;
            let user_id = manager.authenticate(&token).await?;
            Ok(Output::User { user_id })
        }
        Command::AuthorizeService { authorization } => {
            let key = extract_api_key(&authorization_headers(&authorization)?)?;
            manager.authorize_service(&key).await?;
            Ok(Output::Ok { ok: true })
        }
        Command::Reset => manager
            .reset_credentials()
            .await
            .map(|deleted| Output::Reset { deleted }),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap();

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let server = Server::try_new(&project_settings).await?;
    let result = run(&server, cli.command).await;
    server.shutdown().await;

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            let error = ApiError::from(ApiErrorCode::from(err));
            println!("{}", serde_json::to_string_pretty(&error)?);
            Ok(ExitCode::FAILURE)
        }
    }
}
