use env_logger::{Builder, Env};
use log::LevelFilter;
use std::io::Write;

/// Фильтр по умолчанию, если RUST_LOG не задан
pub const DEFAULT_LOG_FILTER: &str = "warn,asmr_mixer=info";

/// Инициализация логгера для бинарников и примеров.
///
/// Библиотека сама логгер не устанавливает. Повторный вызов безопасен.
pub fn init_logger() {
    let env = Env::default().filter_or("RUST_LOG", DEFAULT_LOG_FILTER);

    let mut builder = Builder::from_env(env);

    builder
        .filter_module("tokio", LevelFilter::Error)
        .filter_module("mio", LevelFilter::Error)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr);

    let _ = builder.try_init();
}
