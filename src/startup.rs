use std::net::TcpListener;
use std::sync::Arc;

use actix_web::dev::Server;
use actix_web::{middleware::Logger, web, App, HttpServer};

use crate::auth::AuthService;
use crate::configuration::CorsSettings;
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::{build_cors, AuthMiddleware, TokenCarrier};
use crate::repositories::UserRepository;
use crate::routes::{
    create_user, delete_user, get_users, health_check, login, logout, register, update_user,
};

pub fn run(
    listener: TcpListener,
    auth: AuthService,
    users: Arc<dyn UserRepository>,
    carrier: TokenCarrier,
    cors: CorsSettings,
) -> Result<Server, std::io::Error> {
    let tokens = auth.tokens();
    let auth = web::Data::new(auth);
    let users: web::Data<dyn UserRepository> = web::Data::from(users);
    let carrier_data = web::Data::new(carrier.clone());

    let server = HttpServer::new(move || {
        App::new()
            // Global middleware
            .wrap(Logger::default())
            .wrap(LoggerMiddleware)
            // Outermost, so preflights are answered before the auth gate
            .wrap(build_cors(&cors))

            // Malformed bodies and query strings become 400 ClientError
            .app_data(
                web::JsonConfig::default()
                    .error_handler(|err, _req| AppError::Client(err.to_string()).into()),
            )
            .app_data(
                web::QueryConfig::default()
                    .error_handler(|err, _req| AppError::Client(err.to_string()).into()),
            )

            // Shared state
            .app_data(auth.clone())
            .app_data(users.clone())
            .app_data(carrier_data.clone())

            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/admin")
                    .route("/register", web::post().to(register))
                    .route("/login", web::post().to(login))
                    .service(
                        web::resource("/logout")
                            .wrap(AuthMiddleware::new(tokens.clone(), carrier.clone()))
                            .route(web::post().to(logout)),
                    ),
            )
            .service(
                web::scope("/user")
                    .wrap(AuthMiddleware::new(tokens.clone(), carrier.clone()))
                    .route("", web::get().to(get_users))
                    .route("/create", web::post().to(create_user))
                    .route("/update", web::put().to(update_user))
                    .route("/delete", web::delete().to(delete_user)),
            )
    })
    .listen(listener)?
    .run();

    Ok(server)
}
