use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use affiliate_rewards::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
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
    let config = Config::from_toml()
        .map_err(|e| std::io::Error::other(format!("Failed to load configuration: {e}")))?;

    // 数据库连接池 + 迁移
    let pool = create_pool(&config.database)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to connect to database: {e}")))?;
    run_migrations(&pool)
        .await
        .map_err(|e| std::io::Error::other(format!("Failed to run database migrations: {e}")))?;

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);

    // 组装服务：账本 -> 优惠券 -> 批次/提现 -> 返利入口
    let ledger_service = LedgerService::new(pool.clone(), config.rewards.debit_max_attempts);
    let coupon_service = CouponService::new(pool.clone());
    let batch_service =
        ReferralBatchService::new(pool.clone(), coupon_service.clone(), config.rewards.clone());
    let withdrawal_service = WithdrawalService::new(pool.clone(), ledger_service.clone());
    let rewards_service = RewardsService::new(
        ledger_service,
        coupon_service,
        batch_service,
        withdrawal_service,
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let server_config = config.server.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors(&server_config))
            .app_data(web::Data::new(rewards_service.clone()))
            .configure(swagger_config)
            .service(
                web::scope("/api/v1")
                    .configure(handlers::affiliate_config)
                    .configure(handlers::coupon_config)
                    .configure(handlers::referral_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
