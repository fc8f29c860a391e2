//! HTTP request handlers.

use std::future::Future;
use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use tracing::Instrument;

use gateway_types::{
    CaptureCardPaymentRequest, CreateCardPaymentRequest, CreateCustomerRequest,
    CreateEWalletChargeRequest, CreateOtcPaymentRequest, CreatePaymentMethodRequest,
    CreatePaymentRequest, CreateQrCodeRequest, ErrorKind, ListPaymentMethodsQuery,
    ListPaymentsQuery, NormalizedError, PaymentProcessor, RefundCardPaymentRequest,
    UpdatePaymentMethodRequest,
};

use crate::GatewayService;
use crate::notify::NotificationBus;

/// Application state shared across handlers.
pub struct AppState<P: PaymentProcessor> {
    pub service: Arc<GatewayService<P>>,
    pub bus: Arc<NotificationBus>,
}

/// Wrapper to implement IntoResponse for NormalizedError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub NormalizedError);

impl From<NormalizedError> for ApiError {
    fn from(err: NormalizedError) -> Self {
        ApiError(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(NormalizedError::validation(rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError(NormalizedError::validation(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind {
            ErrorKind::Validation | ErrorKind::ThirdPartyFailure => StatusCode::BAD_REQUEST,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "status": "error",
            "message": self.0.message,
            "error": self.0.message,
            "data": {}
        });

        (status, Json(body)).into_response()
    }
}

/// Runs a processor mutation on its own task.
///
/// The task keeps running when the client goes away, so a mutation that has
/// been sent to the processor is never abandoned halfway.
async fn detached<T, F>(work: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: Future<Output = Result<T, NormalizedError>> + Send + 'static,
{
    match tokio::spawn(work.in_current_span()).await {
        Ok(result) => result.map_err(ApiError),
        Err(e) => Err(ApiError(
            NormalizedError::internal("Request task failed").with_cause(e),
        )),
    }
}

/// Health check endpoint.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

// ─────────────────────────────────────────────────────────────────────────────
// Customers
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub async fn create_customer<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreateCustomerRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let service = Arc::clone(&state.service);
    let customer = detached(async move { service.create_customer(req).await }).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

#[tracing::instrument(skip(state))]
pub async fn get_customer<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = state.service.get_customer(&id).await?;
    Ok(Json(customer))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payment methods
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub async fn create_payment_method<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreatePaymentMethodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let service = Arc::clone(&state.service);
    let method = detached(async move { service.create_payment_method(req).await }).await?;
    Ok((StatusCode::CREATED, Json(method)))
}

#[tracing::instrument(skip(state))]
pub async fn get_payment_method<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let method = state.service.get_payment_method(&id).await?;
    Ok(Json(method))
}

#[tracing::instrument(skip(state, payload))]
pub async fn update_payment_method<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdatePaymentMethodRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let service = Arc::clone(&state.service);
    let method = detached(async move { service.update_payment_method(&id, req).await }).await?;
    Ok(Json(method))
}

#[tracing::instrument(skip_all)]
pub async fn list_payment_methods<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    query: Result<Query<ListPaymentMethodsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let methods = state.service.list_payment_methods(query).await?;
    Ok(Json(methods))
}

#[tracing::instrument(skip(state))]
pub async fn expire_payment_method<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = Arc::clone(&state.service);
    let method = detached(async move { service.expire_payment_method(&id).await }).await?;
    Ok(Json(method))
}

#[tracing::instrument(skip(state, query))]
pub async fn list_payments_by_payment_method<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
    query: Result<Query<ListPaymentsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let payments = state
        .service
        .list_payments_by_payment_method(&id, query)
        .await?;
    Ok(Json(payments))
}

// ─────────────────────────────────────────────────────────────────────────────
// Payments
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub async fn create_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreatePaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let payment = detached(async move {
        let committed = state.service.create_payment(req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[tracing::instrument(skip(state))]
pub async fn get_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state.service.get_payment(&id).await?;
    Ok(Json(payment))
}

#[tracing::instrument(skip_all)]
pub async fn list_payments<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    query: Result<Query<ListPaymentsQuery>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    let payments = state.service.list_payments(query).await?;
    Ok(Json(payments))
}

// ─────────────────────────────────────────────────────────────────────────────
// Card payments
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub async fn create_card_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreateCardPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let charge = detached(async move {
        let committed = state.service.create_card_payment(req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(charge)))
}

#[tracing::instrument(skip(state, payload))]
pub async fn capture_card_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
    payload: Result<Json<CaptureCardPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let charge = detached(async move {
        let committed = state.service.capture_card_payment(&id, req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok(Json(charge))
}

#[tracing::instrument(skip(state, payload))]
pub async fn refund_card_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
    payload: Result<Json<RefundCardPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let refund = detached(async move {
        let committed = state.service.refund_card_payment(&id, req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok(Json(refund))
}

// ─────────────────────────────────────────────────────────────────────────────
// E-wallet, QR code and OTC payments
// ─────────────────────────────────────────────────────────────────────────────

#[tracing::instrument(skip_all)]
pub async fn create_ewallet_charge<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreateEWalletChargeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let charge = detached(async move {
        let committed = state.service.create_ewallet_charge(req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(charge)))
}

#[tracing::instrument(skip(state))]
pub async fn get_ewallet_charge<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let charge = state.service.get_ewallet_charge_status(&id).await?;
    Ok(Json(charge))
}

#[tracing::instrument(skip_all)]
pub async fn create_qr_code<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreateQrCodeRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let qr = detached(async move {
        let committed = state.service.create_qr_code_payment(req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(qr)))
}

#[tracing::instrument(skip(state))]
pub async fn get_qr_code<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let qr = state.service.get_qr_code_payment_status(&id).await?;
    Ok(Json(qr))
}

#[tracing::instrument(skip_all)]
pub async fn create_otc_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    payload: Result<Json<CreateOtcPaymentRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let payment = detached(async move {
        let committed = state.service.create_otc_payment(req).await?;
        Ok::<_, NormalizedError>(committed.apply(&state.bus))
    })
    .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

#[tracing::instrument(skip(state))]
pub async fn get_otc_payment<P: PaymentProcessor>(
    State(state): State<Arc<AppState<P>>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let payment = state.service.get_otc_payment_status(&id).await?;
    Ok(Json(payment))
}
