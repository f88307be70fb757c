//! Authentication service: email login, session lookup and invite-only
//! registration.

use chrono::Utc;
use tour::error::{TourError, TourResult};
use tour::models::invite::{CreateInvite, InviteCreator, InviteLink, InviteStatus};
use tour::models::session::{CreateSession, Session};
use tour::models::user::{CreateUser, User, normalize_email};
use tour::repository::{InviteRepository, SessionRepository, UserRepository};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::token;

/// A freshly issued session. `token` is the raw bearer value; only its hash
/// is stored.
#[derive(Debug)]
pub struct LoginOutput {
    pub user: User,
    pub token: String,
    pub session: Session,
}

/// Successful registration: the new operator, already logged in.
pub type RegisterOutput = LoginOutput;

/// Resolved caller of an authenticated request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: User,
    pub session: Session,
}

/// Input for the registration flow.
#[derive(Debug)]
pub struct RegisterInput {
    pub token: String,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviteValidation {
    pub valid: bool,
    /// Email the invite is bound to, if any.
    pub email: Option<String>,
}

#[derive(Debug, Clone)]
pub struct BootstrapStatus {
    pub needs_bootstrap: bool,
    pub invite: Option<InviteLink>,
}

/// Authentication service, generic over the repositories it needs.
#[derive(Clone)]
pub struct AuthService<S> {
    store: S,
    config: AuthConfig,
}

impl<S> AuthService<S>
where
    S: UserRepository + SessionRepository + InviteRepository,
{
    pub fn new(store: S, config: AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Log in by email. Unknown addresses fail `NotFound`.
    pub async fn login(&self, email: &str) -> TourResult<LoginOutput> {
        let email = normalize_email(email);
        if email.is_empty() {
            return Err(TourError::validation("email is required"));
        }
        let Some(user) = self.store.find_user_by_email(&email).await? else {
            warn!(outcome = "unknown_email", "login failed");
            return Err(TourError::not_found("user", email));
        };
        let output = self.issue_session(user).await?;
        info!(user_id = %output.user.id, outcome = "success", "login");
        Ok(output)
    }

    async fn issue_session(&self, user: User) -> TourResult<LoginOutput> {
        let raw = token::generate_token();
        let session = self
            .store
            .create_session(CreateSession {
                user_id: user.id,
                token_hash: token::hash_token(&raw),
                expires_at: self.config.session_expiry(Utc::now())?,
            })
            .await?;
        Ok(LoginOutput {
            user,
            token: raw,
            session,
        })
    }

    /// Resolve a raw session token to its user.
    ///
    /// An expired session is deleted on sight and reported as
    /// `Unauthenticated`, as is a session whose user no longer exists.
    pub async fn authenticate(&self, raw_token: &str) -> TourResult<AuthContext> {
        let hash = token::hash_token(raw_token);
        let session = self
            .store
            .find_session_by_token_hash(&hash)
            .await?
            .ok_or(TourError::Unauthenticated)?;

        if session.is_expired(Utc::now()) {
            self.store.delete_session(session.id).await?;
            debug!(session_id = %session.id, "expired session removed");
            return Err(TourError::Unauthenticated);
        }

        let user = match self.store.get_user(session.user_id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                self.store.delete_session(session.id).await?;
                return Err(TourError::Unauthenticated);
            }
            Err(e) => return Err(e),
        };
        Ok(AuthContext { user, session })
    }

    pub async fn logout(&self, session_id: Uuid) -> TourResult<()> {
        let removed = self.store.delete_session(session_id).await?;
        info!(session_id = %session_id, removed, "logout");
        Ok(())
    }

    /// Mint an invite, optionally bound to an email address.
    pub async fn create_invite(
        &self,
        creator: InviteCreator,
        email: Option<&str>,
    ) -> TourResult<InviteLink> {
        let email = email.map(normalize_email).filter(|e| !e.is_empty());
        let invite = self
            .store
            .create_invite(CreateInvite {
                token: token::generate_token(),
                email,
                created_by: creator,
                expires_at: self.config.invite_expiry(Utc::now())?,
            })
            .await?;
        info!(
            invite_id = %invite.id,
            created_by = ?invite.created_by.user_id(),
            bound = invite.email.is_some(),
            "invite_created"
        );
        Ok(invite)
    }

    async fn pending_invite(&self, token: &str) -> TourResult<InviteLink> {
        let invite = self
            .store
            .find_invite_by_token(token)
            .await?
            .ok_or_else(|| TourError::not_found("invite", "token"))?;
        match invite.status(Utc::now()) {
            InviteStatus::Pending => Ok(invite),
            InviteStatus::Used => Err(TourError::InviteAlreadyUsed),
            InviteStatus::Expired => Err(TourError::InviteExpired),
        }
    }

    /// Check an invite token before showing the registration form.
    pub async fn validate_invite(&self, token: &str) -> TourResult<InviteValidation> {
        let invite = self.pending_invite(token).await?;
        Ok(InviteValidation {
            valid: true,
            email: invite.email,
        })
    }

    /// Redeem an invite: creates the operator and logs them in.
    ///
    /// User creation and consumption of the invite commit together; a
    /// conflicting email leaves the invite pending.
    pub async fn register(&self, input: RegisterInput) -> TourResult<RegisterOutput> {
        let email = normalize_email(&input.email);
        let name = input.name.trim();
        if email.is_empty() || name.is_empty() {
            return Err(TourError::validation("email and name are required"));
        }

        let invite = self.pending_invite(&input.token).await?;
        if invite.email.as_deref().is_some_and(|bound| bound != email) {
            return Err(TourError::InviteEmailMismatch);
        }
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(TourError::conflict("a user with this email already exists"));
        }

        let user = self
            .store
            .redeem_invite(
                &input.token,
                CreateUser {
                    email,
                    name: name.to_string(),
                    invited_by: invite.created_by.user_id(),
                },
                Utc::now(),
            )
            .await?;
        info!(user_id = %user.id, role = ?user.role, invite_id = %invite.id, "register");
        self.issue_session(user).await
    }

    /// Delete an invite. Only its creator or an admin may do so.
    pub async fn revoke_invite(&self, invite_id: Uuid, requester: &User) -> TourResult<()> {
        let invite = self.store.get_invite(invite_id).await?;
        let is_creator = invite.created_by == InviteCreator::User(requester.id);
        if !is_creator && !requester.role.can_revoke_any_invite() {
            warn!(invite_id = %invite_id, user_id = %requester.id, "invite revoke denied");
            return Err(TourError::forbidden("only the creator or an admin can revoke this invite"));
        }
        self.store.delete_invite(invite_id).await?;
        info!(invite_id = %invite_id, user_id = %requester.id, "invite_revoked");
        Ok(())
    }

    /// Invites created by `requester`, newest first.
    pub async fn list_invites(&self, requester: &User) -> TourResult<Vec<InviteLink>> {
        self.store
            .list_invites_by_creator(InviteCreator::User(requester.id))
            .await
    }

    /// First-run status. While no user exists, hands out a usable `SYSTEM`
    /// invite (the same one on every call until it expires).
    pub async fn bootstrap(&self) -> TourResult<BootstrapStatus> {
        if self.store.count_users().await? > 0 {
            return Ok(BootstrapStatus {
                needs_bootstrap: false,
                invite: None,
            });
        }
        let now = Utc::now();
        let candidate = CreateInvite {
            token: token::generate_token(),
            email: None,
            created_by: InviteCreator::System,
            expires_at: self.config.invite_expiry(now)?,
        };
        let invite = self.store.bootstrap_invite(candidate, now).await?;
        if let Some(invite) = &invite {
            info!(invite_id = %invite.id, "bootstrap invite available");
        }
        Ok(BootstrapStatus {
            needs_bootstrap: invite.is_some(),
            invite,
        })
    }

    /// Remove every expired session. Returns how many were removed.
    pub async fn purge_expired_sessions(&self) -> TourResult<usize> {
        let removed = self.store.purge_expired_sessions(Utc::now()).await?;
        if removed > 0 {
            info!(removed, "expired sessions purged");
        }
        Ok(removed)
    }
}
