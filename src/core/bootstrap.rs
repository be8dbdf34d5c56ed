use crate::core::state::AppState;
use crate::db::types::UserRole;

/// Makes sure the configured first Admin exists. Accounts are never promoted,
/// so an existing non-admin with the same email is left as is.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let email = &admin.first_superuser_email;

    if let Some(user) = state.store().find_user_by_email(email).await? {
        if user.role == UserRole::Admin {
            tracing::info!("Default superuser already present");
        } else {
            tracing::warn!(
                user_id = %user.id,
                role = %user.role,
                "Account with superuser email exists without Admin role; leaving it unchanged"
            );
        }
        return Ok(());
    }

    let user = state
        .identity()
        .create_user(
            &admin.first_superuser_name,
            email,
            &admin.first_superuser_password,
            UserRole::Admin,
        )
        .await?;

    tracing::info!(user_id = %user.id, "Created default superuser {email}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    fn with_superuser_env() {
        std::env::set_var("FIRST_SUPERUSER_EMAIL", "root@x.com");
        std::env::set_var("FIRST_SUPERUSER_PASSWORD", "root-pass");
    }

    fn clear_superuser_env() {
        std::env::remove_var("FIRST_SUPERUSER_EMAIL");
        std::env::remove_var("FIRST_SUPERUSER_PASSWORD");
    }

    #[tokio::test]
    async fn creates_admin_once() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        with_superuser_env();
        let state = test_support::memory_state();
        clear_superuser_env();

        ensure_superuser(&state).await.expect("first run");
        ensure_superuser(&state).await.expect("second run");

        let admins = state.identity().list_by_role(UserRole::Admin).await.expect("admins");
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].email, "root@x.com");

        let session = state.identity().login("root@x.com", "root-pass").await.expect("login");
        assert_eq!(session.user.role, UserRole::Admin);
    }

    #[tokio::test]
    async fn existing_non_admin_is_not_promoted() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        with_superuser_env();
        let state = test_support::memory_state();
        clear_superuser_env();

        state.identity().register("Squatter", "root@x.com", "whatever").await.expect("register");
        ensure_superuser(&state).await.expect("bootstrap");

        let admins = state.identity().list_by_role(UserRole::Admin).await.expect("admins");
        assert!(admins.is_empty());
    }

    #[tokio::test]
    async fn skipped_without_password() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        let state = test_support::memory_state();

        ensure_superuser(&state).await.expect("bootstrap");

        let admins = state.identity().list_by_role(UserRole::Admin).await.expect("admins");
        assert!(admins.is_empty());
    }
}
