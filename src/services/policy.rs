// ============================================================================
// POLITIQUE D'AUTORISATION
// ============================================================================
//
// Fonctions pures: (acteur, action, ressource) -> Decision.
// Aucune requête en base, aucun état global: l'acteur est passé explicitement.
//
// Règles:
//   - Catalogue (category, genre, title): lecture libre, écriture admin/staff
//   - Feedback (review, comment): lecture libre, création authentifiée,
//     modification/suppression par l'auteur, un moderator ou un admin/staff
//   - Annuaire (users): admin/staff uniquement
//   - Profil (/users/me): tout acteur authentifié, lecture et mise à jour
//   - Seul un compte de rôle admin peut changer son propre rôle via /me
//
// ============================================================================

use crate::error::ApiError;
use crate::models::users::{self, Role};

/// Compte authentifié tel que relu en base pour la requête courante.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
    pub is_staff: bool,
}

impl From<&users::Model> for Principal {
    fn from(user: &users::Model) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            is_staff: user.is_staff,
        }
    }
}

impl Principal {
    /// Rôle admin ou drapeau staff.
    pub fn is_admin_equivalent(&self) -> bool {
        match self.role {
            Role::Admin => true,
            Role::Moderator | Role::User => self.is_staff,
        }
    }

    /// Peut modérer le contenu des autres (moderator, admin ou staff).
    pub fn can_moderate(&self) -> bool {
        match self.role {
            Role::Admin | Role::Moderator => true,
            Role::User => self.is_staff,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Actor {
    Anonymous,
    Authenticated(Principal),
}

impl Actor {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Actor::Anonymous => None,
            Actor::Authenticated(principal) => Some(principal),
        }
    }

    /// Le compte authentifié, ou `Unauthenticated`.
    pub fn require_principal(&self) -> Result<&Principal, ApiError> {
        self.principal().ok_or_else(|| {
            ApiError::Unauthenticated("Authentication credentials were not provided.".to_string())
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Catalog,
    /// `author_id` absent pour la collection (liste, création)
    Feedback { author_id: Option<i32> },
    UserDirectory,
    OwnProfile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Decision::Allow
        } else {
            Decision::Deny(Denial::Forbidden)
        }
    }

    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convertit un refus en erreur API.
    pub fn into_result(self) -> Result<(), ApiError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(Denial::Unauthenticated) => Err(ApiError::Unauthenticated(
                "Authentication credentials were not provided.".to_string(),
            )),
            Decision::Deny(Denial::Forbidden) => Err(ApiError::Forbidden(
                "You do not have permission to perform this action.".to_string(),
            )),
        }
    }
}

pub fn authorize(actor: &Actor, action: Action, resource: Resource) -> Decision {
    // Lecture publique du catalogue et du feedback
    if action == Action::Read && matches!(resource, Resource::Catalog | Resource::Feedback { .. }) {
        return Decision::Allow;
    }

    let principal = match actor {
        Actor::Anonymous => return Decision::Deny(Denial::Unauthenticated),
        Actor::Authenticated(principal) => principal,
    };

    match resource {
        Resource::Catalog | Resource::UserDirectory => {
            Decision::from_bool(principal.is_admin_equivalent())
        }
        Resource::Feedback { author_id } => match action {
            Action::Read | Action::Create => Decision::Allow,
            Action::Update | Action::Delete => Decision::from_bool(
                author_id == Some(principal.user_id) || principal.can_moderate(),
            ),
        },
        Resource::OwnProfile => match action {
            Action::Read | Action::Update => Decision::Allow,
            Action::Create | Action::Delete => Decision::Deny(Denial::Forbidden),
        },
    }
}

/// Raccourci: `authorize(...).into_result()`
pub fn ensure(actor: &Actor, action: Action, resource: Resource) -> Result<(), ApiError> {
    let decision = authorize(actor, action, resource);
    if !decision.is_allowed() {
        tracing::debug!(?action, ?resource, ?decision, "request denied by policy");
    }
    decision.into_result()
}

/// Seul un compte de rôle admin peut changer son propre rôle.
/// Pour les autres, le champ est ignoré (pas d'erreur).
pub fn may_change_own_role(principal: &Principal) -> bool {
    match principal.role {
        Role::Admin => true,
        Role::Moderator | Role::User => false,
    }
}
