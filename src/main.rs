use std::{process, sync::Arc};

use penna::{
    application::{
        auth::AuthService,
        comments::CommentService,
        error::AppError,
        feed::FeedService,
        posts::PostService,
        repos::{CommentsRepo, PostsRepo, PostsWriteRepo, TagsRepo, TagsWriteRepo, UsersRepo},
        tags::TagService,
        users::UserService,
    },
    config,
    infra::{
        cache::{ResponseCache, ResponseCacheConfig},
        db::PostgresRepositories,
        error::InfraError,
        http::{self, ApiState},
        telemetry,
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_api_state(repositories.clone(), &settings);
    let router = http::build_router(state, repositories);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    info!(addr = %settings.server.addr, "penna listening");

    axum::serve(listener, router.into_make_service())
        .await
        .map_err(|err| AppError::from(InfraError::Io(err)))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;

    sqlx::migrate!("./migrations")
        .run(repositories.pool())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!("migrations applied");
    Ok(())
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = settings.database.url.as_deref().ok_or_else(|| {
        AppError::from(InfraError::configuration(
            "database.url is required (set PENNA__DATABASE__URL or --database-url)",
        ))
    })?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_api_state(repositories: Arc<PostgresRepositories>, settings: &config::Settings) -> ApiState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let tags_repo: Arc<dyn TagsRepo> = repositories.clone();
    let tags_write_repo: Arc<dyn TagsWriteRepo> = repositories.clone();
    let comments_repo: Arc<dyn CommentsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();

    ApiState {
        auth: Arc::new(AuthService::new(users_repo.clone())),
        feed: Arc::new(FeedService::new(posts_repo.clone())),
        posts: Arc::new(PostService::new(
            posts_repo.clone(),
            posts_write_repo,
            tags_write_repo.clone(),
        )),
        tags: Arc::new(TagService::new(tags_repo, tags_write_repo)),
        comments: Arc::new(CommentService::new(comments_repo, posts_repo)),
        users: Arc::new(UserService::new(users_repo)),
        response_cache: Arc::new(ResponseCache::new(ResponseCacheConfig::from(
            &settings.cache,
        ))),
        default_page_size: settings.api.page_size.get(),
    }
}
