use crate::entities::user_entity as users;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(request.username.trim()))
            .one(&self.pool)
            .await?;

        let user = user.ok_or_else(|| AppError::AuthError("用户不存在或密码错误".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::AuthError("用户不存在或密码错误".to_string()));
        }

        self.issue_tokens(user, None)
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> AppResult<AuthResponse> {
        let claims = self.jwt_service.verify_refresh_token(refresh_token)?;
        let user_id: i64 = claims
            .sub
            .parse()
            .map_err(|_| AppError::AuthError("无效的令牌".to_string()))?;

        let user = users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("用户不存在".to_string()))?;

        self.issue_tokens(user, Some(refresh_token.to_string()))
    }

    fn issue_tokens(
        &self,
        user: users::Model,
        refresh_token: Option<String>,
    ) -> AppResult<AuthResponse> {
        let access_token = self.jwt_service.generate_access_token(user.id, user.role)?;
        let refresh_token = match refresh_token {
            Some(token) => token,
            None => self.jwt_service.generate_refresh_token(user.id, user.role)?,
        };

        Ok(AuthResponse {
            user: UserResponse::from(user),
            access_token,
            refresh_token,
            expires_in: self.jwt_service.get_access_token_expires_in(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{insert_user, setup_db};

    #[tokio::test]
    async fn test_login_and_refresh() {
        let db = setup_db().await;
        let user = insert_user(&db, "teacher_wang", "王老师", UserRole::Teacher, "Secret123", None, 0)
            .await;
        let jwt = JwtService::new("test-secret", 3600, 7200);
        let service = AuthService::new(db, jwt.clone());

        let auth = service
            .login(LoginRequest {
                username: "teacher_wang".into(),
                password: "Secret123".into(),
            })
            .await
            .unwrap();
        assert_eq!(auth.user.id, user.id);
        let claims = jwt.verify_access_token(&auth.access_token).unwrap();
        assert_eq!(claims.role, UserRole::Teacher);

        let refreshed = service.refresh_token(&auth.refresh_token).await.unwrap();
        assert_eq!(refreshed.user.id, user.id);
        assert_eq!(refreshed.refresh_token, auth.refresh_token);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials_uniformly() {
        let db = setup_db().await;
        insert_user(&db, "student_li", "李四", UserRole::Student, "Secret123", None, 0).await;
        let service = AuthService::new(db, JwtService::new("test-secret", 3600, 7200));

        let wrong_password = service
            .login(LoginRequest {
                username: "student_li".into(),
                password: "nope".into(),
            })
            .await
            .unwrap_err();
        let unknown_user = service
            .login(LoginRequest {
                username: "nobody".into(),
                password: "Secret123".into(),
            })
            .await
            .unwrap_err();

        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }
}
