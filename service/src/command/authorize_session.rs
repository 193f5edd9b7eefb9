//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] issued by the identity service.
#[derive(Clone, Debug, From)]
pub struct AuthorizeSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeSession> for Service<Db> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeSession { token } = cmd;

        Ok(jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config.jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> ExecutionError))?
        .claims)
    }
}

/// Error of [`AuthorizeSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use jsonwebtoken::{EncodingKey, Header};

    use crate::{
        domain::user::{self, session, Role, Session},
        testing, Command as _,
    };

    use super::AuthorizeSession;

    #[expect(unsafe_code, reason = "issued right here")]
    fn token(session: &Session, secret: &[u8]) -> session::Token {
        let token = jsonwebtoken::encode(
            &Header::default(),
            session,
            &EncodingKey::from_secret(secret),
        )
        .unwrap();
        unsafe {
            session::Token::new_unchecked(token)
        }
    }

    fn session(expires_in: i64) -> Session {
        Session {
            user_id: user::Id::new(),
            role: Role::Vendor,
            expires_at: DateTime::from_unix_timestamp(
                DateTime::now().unix_timestamp() + expires_in,
            )
            .unwrap()
            .coerce(),
        }
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let svc = testing::service();
        let issued = session(3600);

        let authorized = svc
            .execute(AuthorizeSession::from(token(
                &issued,
                testing::JWT_SECRET,
            )))
            .await
            .unwrap();

        assert_eq!(authorized.user_id, issued.user_id);
        assert_eq!(authorized.role, Role::Vendor);
    }

    #[tokio::test]
    async fn rejects_foreign_or_expired_token() {
        let svc = testing::service();

        assert!(svc
            .execute(AuthorizeSession::from(token(&session(3600), b"other")))
            .await
            .is_err());
        assert!(svc
            .execute(AuthorizeSession::from(token(
                &session(-3600),
                testing::JWT_SECRET,
            )))
            .await
            .is_err());
    }
}
