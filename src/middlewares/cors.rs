use actix_cors::Cors;

use crate::config::ServerConfig;

/// 未配置允许的来源时放行所有来源（本地开发）
pub fn create_cors(server: &ServerConfig) -> Cors {
    let cors = if server.allowed_origins.is_empty() {
        Cors::default().allowed_origin_fn(|_, _req_head| true)
    } else {
        server
            .allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}
