// ============================================================================
// SERVICES - LOGIQUE MÉTIER
// ============================================================================
//
//   - policy : décisions d'autorisation pures (acteur, action, ressource)
//   - auth_service : inscription, échange code -> token, résolution de l'acteur
//   - catalog_service : catégories, genres, titres (+ note moyenne)
//   - feedback_service : reviews et commentaires
//   - user_service : annuaire des utilisateurs et /users/me
//   - mailer : envoi des codes de confirmation
//   - pagination : page/page_size et enveloppe {count, page, num_pages, results}
//
// ============================================================================

pub mod policy;
pub mod auth_service;
pub mod catalog_service;
pub mod feedback_service;
pub mod user_service;
pub mod mailer;
pub mod pagination;
