//! Customer sign-in by one-time passcode, and customer profiles.

use crate::dto::{
    CustomerAuthResponse, CustomerResponse, OtpRequestedResponse, RefreshTokenRequest,
    RequestOtpRequest, UpdateCustomerRequest, VerifyOtpRequest,
};
use crate::otp_sender::{mask_phone, OtpSender};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trimly_config::OtpConfig;
use trimly_core::{
    normalize_phone, Clock, Customer, Email, Interface, OtpChallenge, TrimlyError, TrimlyResult,
    ValidateExt,
};
use trimly_repository::{CustomerRepository, OtpRepository, Repositories};
use trimly_security::{
    generate_numeric_code, is_well_formed_code, Claims, ClaimsExt, KeyedRateLimiter,
    PasswordHasher, TokenProvider, TokenSubject,
};

/// Customer service trait.
#[async_trait]
pub trait CustomerService: Interface + Send + Sync {
    /// Issues a passcode to a phone. Rate limited per phone.
    async fn request_otp(&self, request: RequestOtpRequest) -> TrimlyResult<OtpRequestedResponse>;

    /// Exchanges a passcode for tokens, signing the customer up on first use.
    async fn verify_otp(&self, request: VerifyOtpRequest) -> TrimlyResult<CustomerAuthResponse>;

    /// Exchanges a customer refresh token for a new pair.
    async fn refresh_token(&self, request: RefreshTokenRequest) -> TrimlyResult<CustomerAuthResponse>;

    async fn profile(&self, claims: &Claims) -> TrimlyResult<CustomerResponse>;

    async fn update_profile(
        &self,
        claims: &Claims,
        request: UpdateCustomerRequest,
    ) -> TrimlyResult<CustomerResponse>;
}

/// Customer service implementation.
pub struct CustomerServiceImpl {
    customers: Arc<dyn CustomerRepository>,
    challenges: Arc<dyn OtpRepository>,
    hasher: Arc<PasswordHasher>,
    token_provider: Arc<TokenProvider>,
    sender: Arc<dyn OtpSender>,
    limiter: KeyedRateLimiter,
    config: OtpConfig,
    clock: Arc<dyn Clock>,
}

impl CustomerServiceImpl {
    /// Creates a new customer service.
    pub fn new(
        repos: &Repositories,
        hasher: Arc<PasswordHasher>,
        token_provider: Arc<TokenProvider>,
        sender: Arc<dyn OtpSender>,
        config: OtpConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let limiter = KeyedRateLimiter::new(
            config.max_requests,
            std::time::Duration::from_secs(config.request_window_secs),
        );
        Self {
            customers: Arc::clone(&repos.customers),
            challenges: Arc::clone(&repos.otp),
            hasher,
            token_provider,
            sender,
            limiter,
            config,
            clock,
        }
    }

    fn create_auth_response(&self, customer: Customer, is_new_customer: bool) -> TrimlyResult<CustomerAuthResponse> {
        let tokens = self
            .token_provider
            .generate_tokens(&TokenSubject::for_customer(&customer))?;

        Ok(CustomerAuthResponse {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            token_type: tokens.token_type,
            expires_in: tokens.access_expires_in,
            is_new_customer,
            customer: customer.into(),
        })
    }

    async fn load_customer(&self, claims: &Claims) -> TrimlyResult<Customer> {
        let id = claims.require_customer()?;
        self.customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::not_found("Customer", id))
    }

    /// Explains why no attempt could be taken against `phone`.
    async fn attempt_refused(&self, phone: &str, now: DateTime<Utc>) -> TrimlyError {
        let challenge = match self.challenges.find(phone).await {
            Ok(Some(challenge)) => challenge,
            Ok(None) => return TrimlyError::not_found("Verification code", phone),
            Err(e) => return e,
        };
        if challenge.is_expired(now) {
            if let Err(e) = self.challenges.delete(phone).await {
                return e;
            }
            return TrimlyError::OtpExpired;
        }
        warn!("Passcode attempts exhausted for {}", mask_phone(phone));
        TrimlyError::OtpAttemptsExceeded
    }
}

fn normalize_email(email: Option<String>) -> TrimlyResult<Option<String>> {
    email.map(|raw| Email::new(raw).map(String::from)).transpose()
}

#[async_trait]
impl CustomerService for CustomerServiceImpl {
    async fn request_otp(&self, request: RequestOtpRequest) -> TrimlyResult<OtpRequestedResponse> {
        request.validate_request()?;
        let phone = normalize_phone(&request.phone)?;
        debug!("Passcode requested for {}", mask_phone(&phone));

        self.limiter.check(&phone).inspect_err(|_| {
            warn!("Passcode requests throttled for {}", mask_phone(&phone));
        })?;

        let code = generate_numeric_code(self.config.code_length);
        let code_hash = self.hasher.hash(&code)?;
        let now = self.clock.now();
        let challenge = OtpChallenge::new(
            phone.clone(),
            code_hash,
            now + Duration::seconds(self.config.ttl_secs),
            now,
        );
        self.challenges.upsert(&challenge).await?;
        self.sender.send(&phone, &code).await?;

        Ok(OtpRequestedResponse {
            phone,
            expires_in: self.config.ttl_secs,
        })
    }

    async fn verify_otp(&self, request: VerifyOtpRequest) -> TrimlyResult<CustomerAuthResponse> {
        request.validate_request()?;
        let phone = normalize_phone(&request.phone)?;
        let now = self.clock.now();

        // The attempt is counted before the hash is checked, so concurrent
        // guesses cannot exceed the limit.
        let Some(challenge) = self
            .challenges
            .consume_attempt(&phone, self.config.max_attempts, now)
            .await?
        else {
            return Err(self.attempt_refused(&phone, now).await);
        };

        let matches = is_well_formed_code(&request.code, self.config.code_length)
            && self.hasher.verify(&request.code, &challenge.code_hash)?;
        if !matches {
            warn!(
                "Wrong passcode for {} ({} attempts)",
                mask_phone(&phone),
                challenge.attempts
            );
            return Err(TrimlyError::OtpInvalid);
        }

        // Single use: only the caller that removes the challenge signs in.
        if !self.challenges.delete(&phone).await? {
            return Err(TrimlyError::OtpInvalid);
        }
        let email = normalize_email(request.email)?;
        let name = request.name.map(|n| n.trim().to_string());

        match self.customers.find_by_phone(&phone).await? {
            Some(mut customer) => {
                customer.record_login(now);
                if customer.name.is_none() {
                    customer.name = name;
                }
                if customer.email.is_none() {
                    customer.email = email;
                }
                let customer = self.customers.update(&customer).await?;
                info!("Customer {} signed in", customer.id);
                self.create_auth_response(customer, false)
            }
            None => {
                let mut customer = Customer::new(phone, name, email, now);
                customer.record_login(now);
                let customer = self.customers.save(&customer).await?;
                info!("Customer {} signed up", customer.id);
                self.create_auth_response(customer, true)
            }
        }
    }

    async fn refresh_token(&self, request: RefreshTokenRequest) -> TrimlyResult<CustomerAuthResponse> {
        let claims = self.token_provider.validate_refresh_token(&request.refresh_token)?;
        let id = claims.customer_id().ok_or_else(|| {
            TrimlyError::InvalidToken("Refresh token does not belong to a customer".to_string())
        })?;
        let customer = self
            .customers
            .find_by_id(id)
            .await?
            .ok_or_else(|| TrimlyError::InvalidToken("Customer no longer exists".to_string()))?;
        self.create_auth_response(customer, false)
    }

    async fn profile(&self, claims: &Claims) -> TrimlyResult<CustomerResponse> {
        self.load_customer(claims).await.map(CustomerResponse::from)
    }

    async fn update_profile(
        &self,
        claims: &Claims,
        request: UpdateCustomerRequest,
    ) -> TrimlyResult<CustomerResponse> {
        request.validate_request()?;
        let mut customer = self.load_customer(claims).await?;

        if let Some(name) = request.name {
            customer.name = Some(name.trim().to_string());
        }
        if let Some(email) = normalize_email(request.email)? {
            customer.email = Some(email);
        }
        customer.updated_at = self.clock.now();

        let updated = self.customers.update(&customer).await?;
        info!("Customer {} updated their profile", updated.id);
        Ok(updated.into())
    }
}

impl std::fmt::Debug for CustomerServiceImpl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerServiceImpl")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::otp_sender::MockOtpSender;
    use crate::test_support::TestContext;
    use parking_lot::Mutex;

    const PHONE: &str = "+91 98000 00002";

    /// Context whose sender records the last code sent.
    fn context() -> (TestContext, Arc<Mutex<String>>) {
        let last_code = Arc::new(Mutex::new(String::new()));
        let captured = Arc::clone(&last_code);
        let mut sender = MockOtpSender::new();
        sender.expect_send().returning(move |_, code| {
            *captured.lock() = code.to_string();
            Ok(())
        });
        (TestContext::with_otp_sender(Arc::new(sender)), last_code)
    }

    fn verify(code: &str) -> VerifyOtpRequest {
        VerifyOtpRequest {
            phone: PHONE.to_string(),
            code: code.to_string(),
            name: Some("Priya".to_string()),
            email: None,
        }
    }

    fn wrong(code: &str) -> String {
        let first = if code.starts_with('0') { '1' } else { '0' };
        format!("{first}{}", &code[1..])
    }

    async fn request(ctx: &TestContext) -> OtpRequestedResponse {
        ctx.services
            .customers
            .request_otp(RequestOtpRequest {
                phone: PHONE.to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_stores_hash_not_code() {
        let (ctx, code) = context();
        let response = request(&ctx).await;
        assert_eq!(response.phone, "+919800000002");
        assert_eq!(response.expires_in, 300);

        let stored = ctx.repos.otp.find("+919800000002").await.unwrap().unwrap();
        assert_eq!(code.lock().len(), 6);
        assert_ne!(stored.code_hash, *code.lock());
        assert_eq!(stored.attempts, 0);
    }

    #[tokio::test]
    async fn test_signup_then_login() {
        let (ctx, code) = context();
        request(&ctx).await;
        let first = ctx.services.customers.verify_otp(verify(&code.lock().clone())).await.unwrap();
        assert!(first.is_new_customer);
        assert_eq!(first.customer.name.as_deref(), Some("Priya"));
        assert!(ctx.repos.otp.find("+919800000002").await.unwrap().is_none());

        request(&ctx).await;
        let second = ctx.services.customers.verify_otp(verify(&code.lock().clone())).await.unwrap();
        assert!(!second.is_new_customer);
        assert_eq!(second.customer.id, first.customer.id);
    }

    #[tokio::test]
    async fn test_missing_challenge_is_not_found() {
        let (ctx, _) = context();
        let err = ctx.services.customers.verify_otp(verify("123456")).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[tokio::test]
    async fn test_expired_code() {
        let (ctx, code) = context();
        request(&ctx).await;
        ctx.clock.advance(Duration::seconds(301));
        let err = ctx
            .services
            .customers
            .verify_otp(verify(&code.lock().clone()))
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "OTP_EXPIRED");
        assert_eq!(err.status_code(), 410);
    }

    #[tokio::test]
    async fn test_wrong_codes_exhaust_attempts() {
        let (ctx, code) = context();
        request(&ctx).await;
        let good = code.lock().clone();

        for _ in 0..3 {
            let err = ctx.services.customers.verify_otp(verify(&wrong(&good))).await.unwrap_err();
            assert_eq!(err.error_code(), "OTP_INVALID");
        }
        let err = ctx.services.customers.verify_otp(verify(&good)).await.unwrap_err();
        assert_eq!(err.error_code(), "OTP_ATTEMPTS_EXCEEDED");

        // A fresh code resets the counter.
        request(&ctx).await;
        let fresh = code.lock().clone();
        assert!(ctx.services.customers.verify_otp(verify(&fresh)).await.is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_wrong_codes_cannot_exceed_attempt_limit() {
        let (ctx, code) = context();
        request(&ctx).await;
        let bad = wrong(&code.lock().clone());

        let guesses: Vec<_> = (0..32)
            .map(|_| {
                let customers = Arc::clone(&ctx.services.customers);
                let bad = bad.clone();
                tokio::spawn(async move { customers.verify_otp(verify(&bad)).await })
            })
            .collect();

        let mut invalid = 0;
        let mut exhausted = 0;
        for guess in guesses {
            match guess.await.unwrap().unwrap_err().error_code() {
                "OTP_INVALID" => invalid += 1,
                "OTP_ATTEMPTS_EXCEEDED" => exhausted += 1,
                other => panic!("unexpected error {other}"),
            }
        }
        assert_eq!(invalid, 3);
        assert_eq!(exhausted, 29);

        let stored = ctx.repos.otp.find("+919800000002").await.unwrap().unwrap();
        assert_eq!(stored.attempts, 3);
    }

    #[tokio::test]
    async fn test_token_lifetime_ignores_pinned_clock() {
        let (ctx, code) = context();
        ctx.clock.advance(Duration::days(400));
        request(&ctx).await;
        let session = ctx.services.customers.verify_otp(verify(&code.lock().clone())).await.unwrap();
        assert_eq!(
            session.expires_in,
            i64::try_from(ctx.config.security.jwt_access_expiration_secs).unwrap()
        );
    }

    #[tokio::test]
    async fn test_requests_are_rate_limited_per_phone() {
        let (ctx, _) = context();
        for _ in 0..5 {
            request(&ctx).await;
        }
        let err = ctx
            .services
            .customers
            .request_otp(RequestOtpRequest {
                phone: PHONE.to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), 429);

        let other = ctx
            .services
            .customers
            .request_otp(RequestOtpRequest {
                phone: "+919800000003".to_string(),
            })
            .await;
        assert!(other.is_ok());
    }

    #[tokio::test]
    async fn test_profile_update() {
        let (ctx, code) = context();
        request(&ctx).await;
        let auth = ctx.services.customers.verify_otp(verify(&code.lock().clone())).await.unwrap();
        let claims = ctx
            .services
            .auth
            .validate_token(&auth.access_token)
            .await
            .unwrap();

        let updated = ctx
            .services
            .customers
            .update_profile(
                &claims,
                UpdateCustomerRequest {
                    name: None,
                    email: Some("priya@mail.example".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.email.as_deref(), Some("priya@mail.example"));
        assert_eq!(updated.name.as_deref(), Some("Priya"));

        let refreshed = ctx
            .services
            .customers
            .refresh_token(RefreshTokenRequest {
                refresh_token: auth.refresh_token,
            })
            .await
            .unwrap();
        assert_eq!(refreshed.customer.id, auth.customer.id);
    }
}
