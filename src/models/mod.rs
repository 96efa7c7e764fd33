// ============================================================================
// MODELS - MODULE PRINCIPAL
// ============================================================================
//
// Liste des modules:
//   - health : Health check API
//   - users : Comptes (rôle, code de confirmation)
//   - category / genre : Données de référence, slug = clé naturelle
//   - title : Œuvres (catégorie optionnelle, genres via genre_title)
//   - genre_title : Association many-to-many title <-> genre
//   - review : Avis notés 1..10, un seul par (title, auteur)
//   - comment : Commentaires sur une review
//   - dto : Data Transfer Objects pour les requêtes/réponses API
//
// Points d'attention:
//   - Tous les modèles utilisent SeaORM
//   - Le schéma de référence est dans migrations/001_init.sql
//
// ============================================================================

pub mod health;
pub mod users;
pub mod category;
pub mod genre;
pub mod title;
pub mod genre_title;
pub mod review;
pub mod comment;
pub mod dto;
