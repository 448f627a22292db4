// Catalog services
pub mod attributes;
pub mod categories;
pub mod products;

// Demo data population
pub mod seeder;

use crate::errors::ServiceError;

pub use attributes::AttributeService;
pub use categories::CategoryService;
pub use products::ProductService;
pub use seeder::SeedService;

/// Drops repeated ids, keeping first-seen order.
pub(crate) fn dedup_ids(ids: &[i32]) -> Vec<i32> {
    let mut seen = std::collections::HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Translates an update that touched no rows.
///
/// The row vanished under us when `still_exists` is false; otherwise another
/// writer got in the way.
pub(crate) fn record_not_updated(entity: &str, id: i32, still_exists: bool) -> ServiceError {
    if still_exists {
        ServiceError::Conflict(format!("{} with ID {} was modified concurrently", entity, id))
    } else {
        ServiceError::NotFound(format!("{} with ID {} not found", entity, id))
    }
}
