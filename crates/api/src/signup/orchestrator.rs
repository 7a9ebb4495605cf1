//! Demo-signup orchestrator service.
//!
//! Coordinates validation, the client/subscription transaction, credential
//! generation and provisioning dispatch, and folds every outcome into one
//! [`Notification`]. Held in [`AppState`](crate::state::AppState) as an
//! `Arc<SignupOrchestrator>`.

use erpbtp_core::credentials::ProvisioningCredentials;
use erpbtp_core::error::CoreError;
use erpbtp_core::naming::client_identifier;
use erpbtp_core::plans::{Plan, TRIAL_DAYS};
use erpbtp_core::provisioning::{
    report, FailureKind, ProgressReporter, ProvisioningDispatcher, ProvisioningOutcome,
    ProvisioningParams, ProvisioningSettings,
};
use erpbtp_core::signup::{Notification, Severity, SignupRequest, ValidatedSignup};
use erpbtp_core::types::DbId;
use erpbtp_db::models::client::{Client, CreateClient};
use erpbtp_db::models::subscription::Subscription;
use erpbtp_db::repositories::{ClientRepo, SubscriptionRepo};
use serde::Serialize;
use sqlx::PgPool;

/// Shown for any repository failure. Details go to the log only.
pub const RECORDING_FAILED_MESSAGE: &str =
    "An error occurred while recording your signup, please try again later";

/// Which terminal state a submission reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SignupOutcome {
    /// Missing field or consent; nothing written.
    Invalid,
    /// Trial requested while a subscription is active; nothing written.
    AlreadyActive,
    /// Active subscription moved to a paid plan; no provisioning.
    Upgraded,
    /// Subscription created and deployment provisioned.
    Provisioned,
    /// Subscription created, provisioning failed.
    ProvisioningFailed,
    /// Transaction rolled back.
    RecordingFailed,
}

/// Everything the caller needs to render one signup result.
#[derive(Debug, Clone, Serialize)]
pub struct SignupResult {
    #[serde(flatten)]
    pub notification: Notification,
    pub outcome: SignupOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<DbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<FailureKind>,
}

impl SignupResult {
    fn new(notification: Notification, outcome: SignupOutcome) -> Self {
        Self {
            notification,
            outcome,
            client_id: None,
            subscription_id: None,
            failure_kind: None,
        }
    }

    fn for_rows(mut self, client: &Client, subscription: &Subscription) -> Self {
        self.client_id = Some(client.id);
        self.subscription_id = Some(subscription.id);
        self
    }

    pub fn severity(&self) -> Severity {
        self.notification.severity
    }
}

/// State of the database after the signup transaction.
enum Recorded {
    AlreadyActive {
        client: Client,
        subscription: Subscription,
    },
    Upgraded {
        client: Client,
        subscription: Subscription,
    },
    /// New subscription committed; provisioning still to run.
    Created {
        client: Client,
        subscription: Subscription,
        credentials: ProvisioningCredentials,
    },
}

/// Failure inside the signup transaction.
#[derive(Debug, thiserror::Error)]
enum RecordError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Runs one demo signup end to end.
///
/// Lifecycle:
/// 1. Validate required fields and consent.
/// 2. In one transaction: upsert the client, inspect its active subscription,
///    then either stop (trial already active), upgrade in place, or create a
///    trial subscription and generate credentials.
/// 3. Commit, releasing the connection before the provisioning wait.
/// 4. Dispatch provisioning and map its outcome to a notification.
pub struct SignupOrchestrator {
    pool: PgPool,
    dispatcher: ProvisioningDispatcher,
}

impl SignupOrchestrator {
    pub fn new(pool: PgPool, settings: ProvisioningSettings) -> Self {
        Self {
            pool,
            dispatcher: ProvisioningDispatcher::new(settings),
        }
    }

    /// Process one submission. Never fails: every error becomes a notification.
    pub async fn submit(
        &self,
        request: &SignupRequest,
        progress: &dyn ProgressReporter,
    ) -> SignupResult {
        let signup = match request.validate() {
            Ok(signup) => signup,
            Err(e) => {
                let message = match e {
                    CoreError::Validation(msg) => msg,
                    other => other.to_string(),
                };
                tracing::debug!(%message, "Signup rejected by validation");
                return SignupResult::new(Notification::negative(message), SignupOutcome::Invalid);
            }
        };

        report(progress, "Recording your signup");
        let recorded = match self.record(&signup).await {
            Ok(recorded) => recorded,
            Err(e) => {
                tracing::error!(email = %signup.email, error = %e, "Signup transaction rolled back");
                return SignupResult::new(
                    Notification::negative(RECORDING_FAILED_MESSAGE),
                    SignupOutcome::RecordingFailed,
                );
            }
        };

        match recorded {
            Recorded::AlreadyActive {
                client,
                subscription,
            } => {
                tracing::info!(client_id = client.id, plan = %subscription.plan, "Trial refused, subscription already active");
                SignupResult::new(
                    Notification::warning(format!(
                        "You already have an active subscription ({})",
                        subscription.plan
                    )),
                    SignupOutcome::AlreadyActive,
                )
                .for_rows(&client, &subscription)
            }
            Recorded::Upgraded {
                client,
                subscription,
            } => {
                tracing::info!(client_id = client.id, subscription_id = subscription.id, plan = %subscription.plan, "Subscription upgraded");
                SignupResult::new(
                    Notification::positive(format!(
                        "Subscription updated to {} - {TRIAL_DAYS}-day trial",
                        subscription.plan.to_uppercase()
                    )),
                    SignupOutcome::Upgraded,
                )
                .for_rows(&client, &subscription)
            }
            Recorded::Created {
                client,
                subscription,
                credentials,
            } => {
                self.provision(&signup, &client, &subscription, &credentials, progress)
                    .await
            }
        }
    }

    /// The signup transaction. Rolled back on any error.
    async fn record(&self, signup: &ValidatedSignup) -> Result<Recorded, RecordError> {
        let mut tx = self.pool.begin().await?;

        let (client, created) = ClientRepo::upsert(
            &mut tx,
            &CreateClient {
                last_name: signup.last_name.clone(),
                first_name: Some(signup.first_name.clone()),
                email: signup.email.clone(),
                company: signup.company.clone(),
                phone: Some(signup.phone.clone()),
            },
        )
        .await?;
        if created {
            tracing::info!(client_id = client.id, "Client created");
        }

        let plan = signup.plan;
        let recorded = match SubscriptionRepo::find_active(&mut tx, client.id).await? {
            Some(subscription) if !plan.is_paid_tier() => {
                tx.rollback().await?;
                return Ok(Recorded::AlreadyActive {
                    client,
                    subscription,
                });
            }
            Some(existing) => {
                let subscription = SubscriptionRepo::upgrade(
                    &mut tx,
                    existing.id,
                    plan,
                    plan.monthly_price(),
                    TRIAL_DAYS,
                )
                .await?;
                Recorded::Upgraded {
                    client,
                    subscription,
                }
            }
            None => {
                let subscription = SubscriptionRepo::create(
                    &mut tx,
                    client.id,
                    plan,
                    plan.monthly_price(),
                    TRIAL_DAYS,
                )
                .await?;
                let credentials = ProvisioningCredentials::generate()?;
                Recorded::Created {
                    client,
                    subscription,
                    credentials,
                }
            }
        };

        tx.commit().await?;
        Ok(recorded)
    }

    async fn provision(
        &self,
        signup: &ValidatedSignup,
        client: &Client,
        subscription: &Subscription,
        credentials: &ProvisioningCredentials,
        progress: &dyn ProgressReporter,
    ) -> SignupResult {
        let client_name = client_identifier(&signup.company);
        tracing::info!(
            client_id = client.id,
            subscription_id = subscription.id,
            client = %client_name,
            "Provisioning client deployment"
        );

        let params = ProvisioningParams::new(client_name, credentials);
        let outcome = self.dispatcher.dispatch(&params, progress).await;

        match outcome {
            ProvisioningOutcome::Succeeded { message } => {
                tracing::debug!(client_id = client.id, output = %message, "Provisioning output");
                let notification = Notification::positive(format!(
                    "{}\nLogin: {}\nTemporary password: {}",
                    activation_headline(signup.plan),
                    signup.email,
                    credentials.initial_password
                ));
                SignupResult::new(notification, SignupOutcome::Provisioned)
                    .for_rows(client, subscription)
            }
            ProvisioningOutcome::Failed { kind, message } => {
                tracing::warn!(client_id = client.id, ?kind, error = %message, "Provisioning failed, subscription kept");
                let notification = Notification::warning(format!(
                    "Your subscription was recorded but your environment could not be created: {message}"
                ));
                let mut result = SignupResult::new(notification, SignupOutcome::ProvisioningFailed)
                    .for_rows(client, subscription);
                result.failure_kind = Some(kind);
                result
            }
        }
    }
}

/// First line of the success notification.
fn activation_headline(plan: Plan) -> String {
    match plan {
        Plan::Trial => format!("Your {TRIAL_DAYS}-day free trial is active!"),
        paid => format!(
            "Free trial activated! Plan {} - {TRIAL_DAYS} days free",
            paid.as_str().to_uppercase()
        ),
    }
}
