mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{ConfigError, SecuritySettings, Settings, StorageBackend};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn strict_mode_requires_explicit_secret() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::remove_var("SECRET_KEY");
        std::env::set_var("SECRET_KEY_FILE", std::env::temp_dir().join("edumanage-strict-key"));
        std::env::set_var("EDU_STRICT_CONFIG", "1");

        let result = Settings::load();

        std::env::remove_var("EDU_STRICT_CONFIG");
        std::env::remove_var("SECRET_KEY_FILE");
        assert!(matches!(result, Err(ConfigError::MissingSecret("SECRET_KEY"))));
    }

    #[tokio::test]
    async fn strict_mode_rejects_memory_backend() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("EDU_STRICT_CONFIG", "1");
        std::env::set_var("FIRST_SUPERUSER_PASSWORD", "root-pass");

        let result = Settings::load();

        std::env::remove_var("EDU_STRICT_CONFIG");
        std::env::remove_var("FIRST_SUPERUSER_PASSWORD");
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "STORAGE_BACKEND", .. })
        ));
    }

    #[tokio::test]
    async fn defaults_load_in_test_env() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        let settings = Settings::load().expect("settings");

        assert_eq!(settings.storage().backend, StorageBackend::Memory);
        assert_eq!(settings.api().prefix, "/api");
        assert_eq!(settings.security().access_token_expire_minutes, 60);
        assert_eq!(settings.security().algorithm, "HS256");
    }

    #[tokio::test]
    async fn token_lifetime_is_bounded() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "525600");
        let year = Settings::load();
        std::env::set_var("ACCESS_TOKEN_EXPIRE_MINUTES", "100000000000000");
        let oversized = Settings::load();
        std::env::remove_var("ACCESS_TOKEN_EXPIRE_MINUTES");

        assert_eq!(year.expect("settings").security().access_token_expire_minutes, 525_600);
        assert!(matches!(
            oversized,
            Err(ConfigError::InvalidValue { field: "ACCESS_TOKEN_EXPIRE_MINUTES", .. })
        ));
    }
}
