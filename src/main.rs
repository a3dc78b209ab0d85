use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::sync::Arc;

use lotere_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    live::{
        DbStore, DrawRegistry, DrawStore, LiveDrawService, LiveHub, LivePoller, MetaPublisher,
        system_clock,
    },
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    tasks,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration file");

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // 创建JWT服务
    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.token_expires_in);

    // 直播核心：时钟、注册表、广播枢纽、存储契约
    let clock = system_clock();
    let registry = DrawRegistry::new();
    let hub = LiveHub::new(registry.clone());
    let store: Arc<dyn DrawStore> = Arc::new(DbStore::new(pool.clone()));

    let meta_publisher = MetaPublisher::new(
        store.clone(),
        hub.clone(),
        registry.clone(),
        clock.clone(),
        config.live.clone(),
    );
    let live_draw_service = LiveDrawService::new(
        store.clone(),
        registry.clone(),
        hub.clone(),
        meta_publisher.clone(),
        config.live.clone(),
    );
    let poller = LivePoller::new(
        store.clone(),
        registry.clone(),
        live_draw_service.clone(),
        clock.clone(),
        config.live.clone(),
    );

    // 创建服务
    let auth_service = AuthService::new(config.admin.clone(), jwt_service.clone());
    let pool_service = PoolService::new(
        pool.clone(),
        hub.clone(),
        live_draw_service.clone(),
        meta_publisher.clone(),
        clock.clone(),
        config.live.clone(),
    );
    let schedule_service = ScheduleService::new(pool.clone(), meta_publisher.clone());
    let result_service = ResultService::new(
        pool.clone(),
        hub.clone(),
        clock.clone(),
        config.live.clone(),
    );
    let stats_service = StatsService::new(pool.clone(), clock.clone(), config.live.clone());

    // 启动后台循环：兜底补录 + 直播预热
    tasks::spawn_all(poller);

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(pool_service.clone()))
            .app_data(web::Data::new(schedule_service.clone()))
            .app_data(web::Data::new(result_service.clone()))
            .app_data(web::Data::new(stats_service.clone()))
            .app_data(web::Data::new(live_draw_service.clone()))
            .app_data(web::Data::new(meta_publisher.clone()))
            .app_data(web::Data::new(hub.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::auth_config)
                    .configure(handlers::pool_config)
                    .configure(handlers::schedule_config)
                    .configure(handlers::result_config)
                    .configure(handlers::live_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
