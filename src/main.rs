// Solar TMY API v0.1
use axum::{routing::get, Router};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod errors;
mod helpers;
mod routes;
mod services;

use config::AppConfig;
use routes::estimates::AppState;
use services::location::{LocationResolver, ResolverEndpoints, ZipTable};
use services::nsrdb::NsrdbClient;
use services::simulation::PvlibServiceClient;
use services::typical_year::TypicalYearSynthesizer;

/// Solar TMY API OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Solar TMY API",
        version = "0.1.0",
        description = "Annual solar production estimates for US postal codes. \
            Averages several years of NSRDB hourly irradiance into a typical \
            weather year per location, runs it through a PV simulation engine \
            and reports annual, monthly and hourly output.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Locations", description = "Postal code resolution"),
        (name = "Estimates", description = "PV production estimates"),
    ),
    paths(
        routes::health::health_check,
        routes::locations::get_location,
        routes::estimates::get_estimate,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            services::location::Location,
            services::system::SystemConfig,
            services::system::TrackingMode,
            services::report::ProductionReport,
            services::report::MonthlyEnergy,
            services::report::HourlyPower,
            routes::estimates::EstimateResponse,
            routes::estimates::WeatherCoverage,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solar_tmy_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();

    std::fs::create_dir_all(&config.data_dir).expect("Failed to create data directory");

    let http = reqwest::Client::builder()
        .timeout(config.http_timeout)
        .build()
        .expect("Failed to build HTTP client");

    let table = ZipTable::from_path(&config.zip_table).unwrap_or_else(|e| {
        tracing::warn!(
            "ZIP table {} not loaded, all lookups will use the geocoder: {}",
            config.zip_table.display(),
            e
        );
        ZipTable::default()
    });
    tracing::info!("Loaded {} ZIP codes", table.len());

    let resolver = LocationResolver::new(
        table,
        http.clone(),
        ResolverEndpoints {
            geocoder_url: config.geocoder_url.clone(),
            geocoder_user_agent: config.geocoder_user_agent.clone(),
            country: config.geocoder_country.clone(),
            elevation_url: config.elevation_url.clone(),
        },
    );

    let synthesizer = TypicalYearSynthesizer::new(
        NsrdbClient::new(http.clone(), config.nsrdb.clone()),
        config.weather_years.clone(),
        config.representative_year,
        config.request_delay,
        config.data_dir.clone(),
        config.reuse_cached_tmy,
    )
    .expect("Invalid typical year configuration");

    let app_state = AppState {
        resolver,
        synthesizer,
        engine: PvlibServiceClient::new(http, &config.simulation_url),
    };

    // CORS: read-only API, restrict methods to GET
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/api/v1/locations/:postal_code",
            get(routes::locations::get_location),
        )
        .route("/api/v1/estimate", get(routes::estimates::get_estimate))
        .with_state(app_state);

    let app = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .merge(api_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}
