//! Repository implementations for database operations.

pub mod category;
pub mod certification;
pub mod contact_request;
pub mod job;
pub mod professional;
pub mod review;
pub mod schedule;
pub mod service;
pub mod stats;
pub mod user;
pub mod verification_token;

pub use category::{CategoryRepository, NewCategory};
pub use certification::CertificationRepository;
pub use contact_request::{ContactRequestRepository, NewContactRequest};
pub use job::JobRepository;
pub use professional::{ProfessionalRepository, SearchFilters};
pub use review::ReviewRepository;
pub use schedule::ScheduleRepository;
pub use service::ServiceRepository;
pub use stats::{AdminStats, StatsRepository};
pub use user::{UserListFilters, UserRepository};
pub use verification_token::{PendingToken, VerificationTokenRepository};

/// Locks the professional row for the rest of the transaction.
///
/// Writers of per-professional aggregates (rating, schedule) take this lock
/// first so concurrent transactions serialize instead of overwriting each
/// other. Returns `false` when the professional does not exist.
pub(crate) async fn lock_professional(
    conn: &mut sqlx::PgConnection,
    professional_id: uuid::Uuid,
) -> Result<bool, sqlx::Error> {
    let locked: Option<i32> =
        sqlx::query_scalar("SELECT 1 FROM professionals WHERE id = $1 FOR UPDATE")
            .bind(professional_id)
            .fetch_optional(conn)
            .await?;
    Ok(locked.is_some())
}

/// Escapes `LIKE` wildcards in user input and wraps it for a substring match.
pub(crate) fn contains_pattern(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('%');
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("gas"), "%gas%");
        assert_eq!(contains_pattern("100%_off\\"), "%100\\%\\_off\\\\%");
    }
}
