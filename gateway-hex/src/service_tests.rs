//! GatewayService unit tests.

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::error::Error;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::{Value, json};

    use gateway_types::{
        ErrorKind, HttpMethod, ListPaymentMethodsQuery, ListPaymentsQuery, PaymentMethodStatus,
        PaymentProcessor, ProcessorError, ProcessorRequest, UpdatePaymentMethodRequest,
    };

    use crate::GatewayService;
    use crate::effects::{PaymentUpdate, PostCommit};
    use crate::notify::{Connection, NotificationBus, Topic};

    /// Scripted processor: replays queued responses and records every request.
    pub struct MockProcessor {
        responses: Mutex<VecDeque<Result<Value, ProcessorError>>>,
        requests: Mutex<Vec<ProcessorRequest>>,
        delay: Option<Duration>,
    }

    impl MockProcessor {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
                delay: None,
            }
        }

        pub fn respond(self, body: Value) -> Self {
            self.responses.lock().unwrap().push_back(Ok(body));
            self
        }

        pub fn fail(self, err: ProcessorError) -> Self {
            self.responses.lock().unwrap().push_back(Err(err));
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn requests(&self) -> Vec<ProcessorRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentProcessor for MockProcessor {
        async fn send(&self, request: ProcessorRequest) -> Result<Value, ProcessorError> {
            self.requests.lock().unwrap().push(request);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let next = self.responses.lock().unwrap().pop_front();
            next.unwrap_or_else(|| {
                Err(ProcessorError::Status {
                    status: 500,
                    body: "no scripted response".into(),
                })
            })
        }
    }

    fn service(processor: MockProcessor) -> GatewayService<MockProcessor> {
        GatewayService::new(processor)
    }

    fn payment_request() -> gateway_types::CreatePaymentRequest {
        serde_json::from_value(json!({
            "reference_id": "ref-1",
            "amount": 10000,
            "currency": "IDR",
            "payment_method_id": "pm-1"
        }))
        .unwrap()
    }

    fn refused() -> ProcessorError {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        ProcessorError::Transport(Box::new(io))
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Payments
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_payment_returns_resource_and_update() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "pay-1",
            "status": "SUCCEEDED",
            "reference_id": "ref-1",
            "amount": 10000,
            "currency": "IDR"
        })));

        let committed = svc.create_payment(payment_request()).await.unwrap();

        assert_eq!(committed.resource.id, "pay-1");
        assert_eq!(committed.resource.status, "SUCCEEDED");
        match &committed.effects[..] {
            [PostCommit::PaymentUpdate(PaymentUpdate { payment_id, status, details })] => {
                assert_eq!(payment_id, "pay-1");
                assert_eq!(status, "SUCCEEDED");
                assert_eq!(details["reference_id"], "ref-1");
            }
            other => panic!("unexpected effects: {other:?}"),
        }

        let requests = svc.processor().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(requests[0].path, "/payment_requests");
        assert_eq!(
            requests[0].body,
            Some(json!({
                "reference_id": "ref-1",
                "amount": 10000,
                "currency": "IDR",
                "payment_method_id": "pm-1"
            }))
        );
    }

    #[tokio::test]
    async fn test_transport_failure_is_normalized() {
        let svc = service(MockProcessor::new().fail(refused()));

        let err = svc.create_payment(payment_request()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ThirdPartyFailure);
        assert_eq!(err.http_status, 500);
        assert!(err.message.starts_with("Failed to create payment: "));
        let cause = err.source().expect("cause retained");
        assert!(matches!(
            cause.downcast_ref::<ProcessorError>(),
            Some(ProcessorError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn test_upstream_status_forwarded() {
        let svc = service(MockProcessor::new().fail(ProcessorError::Status {
            status: 404,
            body: r#"{"error_code":"DATA_NOT_FOUND"}"#.into(),
        }));

        let err = svc.get_payment("missing-id").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ThirdPartyFailure);
        assert_eq!(err.http_status, 404);
        assert!(err.message.starts_with("Failed to get payment: "));
    }

    #[tokio::test]
    async fn test_invalid_payment_rejected_before_processor_call() {
        let svc = service(MockProcessor::new());

        let mut req = payment_request();
        req.reference_id = "  ".into();
        let err = svc.create_payment(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(err.message, "reference_id is required");

        let mut req = payment_request();
        req.amount = 0u64.into();
        let err = svc.create_payment(req).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);

        assert!(svc.processor().requests().is_empty());
    }

    #[tokio::test]
    async fn test_identifier_must_be_single_segment() {
        let svc = service(MockProcessor::new());

        let err = svc.get_payment("pay-1/../secret").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(svc.processor().requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_payments_forwards_query() {
        let svc = service(MockProcessor::new().respond(json!({
            "data": [
                {"id": "pay-1", "status": "SUCCEEDED"},
                {"id": "pay-2", "status": "PENDING"}
            ],
            "has_more": false
        })));

        let query = ListPaymentsQuery {
            customer_id: Some("cust-1".into()),
            ..Default::default()
        };
        let payments = svc.list_payments(query).await.unwrap();

        assert_eq!(payments.len(), 2);
        assert_eq!(payments[1].id, "pay-2");
        assert_eq!(
            svc.processor().requests()[0].query,
            vec![("customer_id".to_string(), "cust-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_list_with_malformed_record_fails_whole_call() {
        let svc = service(MockProcessor::new().respond(json!({
            "data": [
                {"id": "pay-1", "status": "SUCCEEDED"},
                {"id": "pay-2"}
            ]
        })));

        let err = svc.list_payments(ListPaymentsQuery::default()).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.starts_with("Failed to list payments: "));
        assert!(err.message.contains("record 1"));
    }

    #[tokio::test]
    async fn test_list_without_data_is_empty() {
        let svc = service(MockProcessor::new().respond(json!({"has_more": false})));

        let methods = svc
            .list_payment_methods(ListPaymentMethodsQuery::default())
            .await
            .unwrap();

        assert!(methods.is_empty());
    }

    #[tokio::test]
    async fn test_slow_processor_times_out() {
        let processor = MockProcessor::new()
            .respond(json!({"id": "pay-1", "status": "PENDING"}))
            .with_delay(Duration::from_millis(500));
        let svc = GatewayService::with_timeout(processor, Duration::from_millis(20));

        let err = svc.get_payment("pay-1").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::ThirdPartyFailure);
        assert_eq!(err.http_status, 500);
        assert!(matches!(
            err.source().and_then(|c| c.downcast_ref::<ProcessorError>()),
            Some(ProcessorError::Timeout(_))
        ));
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Customers and payment methods
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_customer_omits_unset_fields() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "cust-1",
            "reference_id": "ref-1",
            "type": "INDIVIDUAL"
        })));

        let req = serde_json::from_value(json!({"reference_id": "ref-1", "type": "INDIVIDUAL"}))
            .unwrap();
        let customer = svc.create_customer(req).await.unwrap();

        assert_eq!(customer.id, "cust-1");
        assert_eq!(
            svc.processor().requests()[0].body,
            Some(json!({"reference_id": "ref-1", "type": "INDIVIDUAL"}))
        );
    }

    #[tokio::test]
    async fn test_response_missing_required_field_is_internal() {
        let svc = service(MockProcessor::new().respond(json!({"reference_id": "ref-1"})));

        let err = svc.get_customer("cust-1").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
        assert!(err.message.starts_with("Failed to get customer: "));
    }

    #[tokio::test]
    async fn test_unknown_payment_method_status_is_internal() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "pm-1",
            "type": "EWALLET",
            "status": "SOMETHING_NEW"
        })));

        let err = svc.get_payment_method("pm-1").await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Internal);
    }

    #[tokio::test]
    async fn test_empty_update_rejected() {
        let svc = service(MockProcessor::new());

        let err = svc
            .update_payment_method("pm-1", UpdatePaymentMethodRequest::default())
            .await
            .unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
        assert!(svc.processor().requests().is_empty());
    }

    #[tokio::test]
    async fn test_update_payment_method_patches() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "pm-1",
            "type": "EWALLET",
            "status": "INACTIVE"
        })));

        let update = UpdatePaymentMethodRequest {
            status: Some(PaymentMethodStatus::Inactive),
            ..Default::default()
        };
        let method = svc.update_payment_method("pm-1", update).await.unwrap();

        assert_eq!(method.status, PaymentMethodStatus::Inactive);
        let request = &svc.processor().requests()[0];
        assert_eq!(request.method, HttpMethod::Patch);
        assert_eq!(request.path, "/v2/payment_methods/pm-1");
        assert_eq!(request.body, Some(json!({"status": "INACTIVE"})));
    }

    #[tokio::test]
    async fn test_expire_payment_method_posts_without_body() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "pm-1",
            "type": "CARD",
            "status": "EXPIRED"
        })));

        svc.expire_payment_method("pm-1").await.unwrap();

        let request = &svc.processor().requests()[0];
        assert_eq!(request.path, "/v2/payment_methods/pm-1/expire");
        assert_eq!(request.body, None);
    }

    #[tokio::test]
    async fn test_list_payments_by_payment_method() {
        let svc = service(MockProcessor::new().fail(refused()));

        let err = svc
            .list_payments_by_payment_method("pm-1", ListPaymentsQuery::default())
            .await
            .unwrap_err();

        assert!(err.message.starts_with("Failed to list payments by payment method: "));
        assert_eq!(
            svc.processor().requests()[0].path,
            "/v2/payment_methods/pm-1/payments"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Channels
    // ─────────────────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_refund_notifies_charge_topic() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "rfd-1",
            "status": "REQUESTED",
            "credit_card_charge_id": "chg-1"
        })));

        let req = serde_json::from_value(json!({"amount": 5000, "external_id": "ext-1"})).unwrap();
        let committed = svc.refund_card_payment("chg-1", req).await.unwrap();

        assert_eq!(committed.resource.id, "rfd-1");
        assert!(matches!(
            &committed.effects[0],
            PostCommit::PaymentUpdate(update) if update.payment_id == "chg-1"
        ));
        assert_eq!(
            svc.processor().requests()[0].path,
            "/credit_card_charges/chg-1/refund"
        );
    }

    #[tokio::test]
    async fn test_ewallet_charge_uses_charge_amount() {
        let svc = service(MockProcessor::new().respond(json!({
            "id": "ewc-1",
            "status": "PENDING",
            "charge_amount": 10000
        })));

        let req = serde_json::from_value(json!({
            "reference_id": "ref-1",
            "currency": "IDR",
            "amount": 10000,
            "channel_code": "ID_OVO"
        }))
        .unwrap();
        let committed = svc.create_ewallet_charge(req).await.unwrap();

        assert_eq!(committed.resource.id, "ewc-1");
        let body = svc.processor().requests()[0].body.clone().unwrap();
        assert_eq!(body["charge_amount"], 10000);
    }

    #[tokio::test]
    async fn test_channel_updates_use_payment_topic() {
        let svc = service(
            MockProcessor::new()
                .respond(json!({"id": "ewc-2", "status": "PENDING", "charge_amount": 10000}))
                .respond(json!({"id": "qr-2", "status": "ACTIVE", "qr_string": "000201"})),
        );
        let bus = NotificationBus::new();
        let (conn, mut outbox) = Connection::open();
        bus.connect(&conn);
        bus.subscribe(&conn, "ewc-2").unwrap();
        bus.subscribe(&conn, "qr-2").unwrap();
        while outbox.try_recv().is_ok() {}

        let charge = serde_json::from_value(json!({
            "reference_id": "ref-1",
            "currency": "IDR",
            "amount": 10000,
            "channel_code": "ID_OVO"
        }))
        .unwrap();
        svc.create_ewallet_charge(charge).await.unwrap().apply(&bus);

        let qr = serde_json::from_value(json!({
            "reference_id": "ref-2",
            "currency": "IDR",
            "amount": 10000
        }))
        .unwrap();
        svc.create_qr_code_payment(qr).await.unwrap().apply(&bus);

        let first = outbox.try_recv().unwrap();
        let second = outbox.try_recv().unwrap();
        assert_eq!(first.data["payment_id"], "ewc-2");
        assert_eq!(second.data["payment_id"], "qr-2");
        assert!(bus.registry().is_member(conn.id(), &Topic::payment("qr-2").unwrap()));
    }

    #[tokio::test]
    async fn test_ewallet_status_error_prefix() {
        let svc = service(MockProcessor::new().fail(refused()));

        let err = svc.get_ewallet_charge_status("ewc-1").await.unwrap_err();

        assert!(err.message.starts_with("Failed to get eWallet charge status: "));
    }

    #[tokio::test]
    async fn test_otc_payment_goes_through_payment_requests() {
        let svc = service(
            MockProcessor::new()
                .respond(json!({"id": "pr-1", "status": "PENDING", "payment_code": "123"}))
                .respond(json!({"id": "pr-1", "status": "SUCCEEDED"})),
        );

        let req = serde_json::from_value(json!({
            "reference_id": "ref-1",
            "currency": "IDR",
            "amount": 15000,
            "payment_method": {"type": "OVER_THE_COUNTER"}
        }))
        .unwrap();
        let committed = svc.create_otc_payment(req).await.unwrap();
        let status = svc.get_otc_payment_status("pr-1").await.unwrap();

        assert_eq!(committed.resource.payment_code.as_deref(), Some("123"));
        assert_eq!(status.status, "SUCCEEDED");

        let paths: Vec<String> = svc
            .processor()
            .requests()
            .into_iter()
            .map(|r| r.path)
            .collect();
        assert_eq!(paths, vec!["/payment_requests", "/payment_requests/pr-1"]);
    }

    #[tokio::test]
    async fn test_qr_code_rejects_non_positive_amount() {
        let svc = service(MockProcessor::new());

        let req = serde_json::from_value(json!({
            "reference_id": "ref-1",
            "currency": "IDR",
            "amount": -5
        }))
        .unwrap();
        let err = svc.create_qr_code_payment(req).await.unwrap_err();

        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
