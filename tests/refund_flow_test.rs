//! End-to-end refund pipeline tests against in-memory collaborators.
//!
//! These cover the scenarios that matter operationally: the happy path,
//! rejections before any money moves, the gateway declining, and the
//! gateway succeeding while the ledger write fails.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use wari_refunds::gateway::{
    GatewayRefundConfirmation, GatewayRefundRequest, ProviderGateway,
};
use wari_refunds::refund::error::{RefundError, RefundResult};
use wari_refunds::refund::processor::RefundProcessor;
use wari_refunds::refund::reconciliation::{AlertSink, ReconciliationAlert};
use wari_refunds::refund::store::{RefundReferences, TransactionStore};
use wari_refunds::refund::types::{
    ProviderCode, RefundAttemptState, RefundRequest, Transaction, TransactionStatus,
};
use wari_refunds::services::ledger::{CreateRefundRecord, LedgerClient};
use wari_refunds::services::merchant_directory::MerchantDirectory;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn wave_transaction(gross: &str) -> Transaction {
    Transaction {
        id: Uuid::new_v4(),
        organization_id: Uuid::new_v4(),
        gross_amount: dec(gross),
        currency: "XOF".to_string(),
        status: TransactionStatus::Completed,
        provider: ProviderCode::Wave,
        provider_transaction_id: Some("wave_tx_123".to_string()),
        provider_checkout_id: Some("wave_co_456".to_string()),
    }
}

struct MemoryStore {
    transaction: Transaction,
    claimed: AtomicBool,
    released: AtomicBool,
}

impl MemoryStore {
    fn new(transaction: Transaction) -> Self {
        Self {
            transaction,
            claimed: AtomicBool::new(false),
            released: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn find_transaction(&self, _transaction_id: Uuid) -> RefundResult<Transaction> {
        Ok(self.transaction.clone())
    }

    async fn find_refund_references(
        &self,
        _transaction_id: Uuid,
    ) -> RefundResult<RefundReferences> {
        Ok(RefundReferences {
            provider_transaction_id: self.transaction.provider_transaction_id.clone(),
            provider_checkout_id: self.transaction.provider_checkout_id.clone(),
        })
    }

    async fn claim_for_refund(&self, _transaction_id: Uuid) -> RefundResult<bool> {
        // First caller wins, exactly like the conditional UPDATE.
        Ok(!self.claimed.swap(true, Ordering::SeqCst))
    }

    async fn release_refund_claim(&self, _transaction_id: Uuid) -> RefundResult<()> {
        self.released.store(true, Ordering::SeqCst);
        self.claimed.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct StubDirectory {
    merchant_id: Option<String>,
}

#[async_trait]
impl MerchantDirectory for StubDirectory {
    async fn provider_merchant_id(
        &self,
        _organization_id: Uuid,
        _provider: ProviderCode,
    ) -> RefundResult<String> {
        match &self.merchant_id {
            Some(id) => Ok(id.clone()),
            None => Err(RefundError::ProviderLookup {
                message: "directory unavailable".to_string(),
            }),
        }
    }
}

struct StubGateway {
    fail: bool,
    calls: AtomicU32,
    last_request: Mutex<Option<GatewayRefundRequest>>,
}

impl StubGateway {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }
}

#[async_trait]
impl ProviderGateway for StubGateway {
    async fn refund(
        &self,
        request: GatewayRefundRequest,
    ) -> RefundResult<GatewayRefundConfirmation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request);
        if self.fail {
            return Err(RefundError::Gateway {
                provider: "wave".to_string(),
                message: "refund declined".to_string(),
                provider_code: Some("insufficient-funds".to_string()),
            });
        }
        Ok(GatewayRefundConfirmation {
            provider_refund_id: "wave_refund_789".to_string(),
            provider_data: None,
        })
    }

    fn provider_name(&self) -> &'static str {
        "wave"
    }
}

struct StubLedger {
    fail: bool,
    records: Mutex<Vec<CreateRefundRecord>>,
}

impl StubLedger {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            records: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl LedgerClient for StubLedger {
    async fn create_refund(&self, record: CreateRefundRecord) -> RefundResult<String> {
        if self.fail {
            return Err(RefundError::Ledger {
                message: "rpc create_refund timed out".to_string(),
            });
        }
        self.records.lock().unwrap().push(record);
        Ok("ledger_refund_001".to_string())
    }
}

#[derive(Default)]
struct CollectingAlerts {
    alerts: Mutex<Vec<ReconciliationAlert>>,
}

impl AlertSink for CollectingAlerts {
    fn raise(&self, alert: ReconciliationAlert) {
        self.alerts.lock().unwrap().push(alert);
    }
}

struct Pipeline {
    processor: RefundProcessor,
    store: Arc<MemoryStore>,
    gateway: Arc<StubGateway>,
    ledger: Arc<StubLedger>,
    alerts: Arc<CollectingAlerts>,
}

fn pipeline(
    transaction: Transaction,
    merchant_id: Option<String>,
    gateway_fails: bool,
    ledger_fails: bool,
) -> Pipeline {
    let store = Arc::new(MemoryStore::new(transaction));
    let gateway = Arc::new(StubGateway::new(gateway_fails));
    let ledger = Arc::new(StubLedger::new(ledger_fails));
    let alerts = Arc::new(CollectingAlerts::default());
    let processor = RefundProcessor::new(
        store.clone(),
        Arc::new(StubDirectory { merchant_id }),
        gateway.clone(),
        ledger.clone(),
        alerts.clone(),
    );
    Pipeline {
        processor,
        store,
        gateway,
        ledger,
        alerts,
    }
}

#[tokio::test]
async fn successful_refund_records_fee_split_in_ledger() {
    let transaction = wave_transaction("10000");
    let transaction_id = transaction.id;
    let p = pipeline(transaction, Some("wave_merchant_9".to_string()), false, false);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("10000"),
            reason: "customer complaint".to_string(),
        })
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.terminal_state, RefundAttemptState::Done);
    assert_eq!(outcome.gateway_reference.as_deref(), Some("wave_refund_789"));
    assert_eq!(outcome.ledger_reference.as_deref(), Some("ledger_refund_001"));

    let breakdown = outcome.breakdown.unwrap();
    assert_eq!(breakdown.processing_fee, dec("200.00"));
    assert_eq!(breakdown.net_amount, dec("9800.00"));

    let records = p.ledger.records.lock().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].processing_fee, dec("200.00"));
    assert_eq!(records[0].net_amount, dec("9800.00"));
    assert_eq!(
        records[0].provider_merchant_id.as_deref(),
        Some("wave_merchant_9")
    );
    assert!(p.alerts.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn directory_outage_does_not_block_the_refund() {
    let transaction = wave_transaction("5000");
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, false);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("2500"),
            reason: "partial refund".to_string(),
        })
        .await;

    assert!(outcome.success);
    let request = p.gateway.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request.merchant_id, None);
    assert_eq!(request.provider_transaction_id, "wave_tx_123");

    let records = p.ledger.records.lock().unwrap();
    assert_eq!(records[0].provider_merchant_id, None);
}

#[tokio::test]
async fn ineligible_transaction_fails_before_any_network_call() {
    let mut transaction = wave_transaction("8000");
    transaction.status = TransactionStatus::Refunded;
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, false);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("8000"),
            reason: "double charge".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure_kind.as_deref(), Some("eligibility"));
    assert_eq!(outcome.terminal_state, RefundAttemptState::ValidationFailed);
    assert_eq!(p.gateway.calls.load(Ordering::SeqCst), 0);
    assert!(p.ledger.records.lock().unwrap().is_empty());
    assert!(!p.store.claimed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn unsupported_provider_is_rejected() {
    let mut transaction = wave_transaction("8000");
    transaction.provider = ProviderCode::OrangeMoney;
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, false);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("100"),
            reason: "wrong item".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure_kind.as_deref(), Some("eligibility"));
    assert_eq!(p.gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn gateway_decline_skips_ledger_and_releases_claim() {
    let transaction = wave_transaction("10000");
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, true, false);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("10000"),
            reason: "customer complaint".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure_kind.as_deref(), Some("gateway"));
    assert_eq!(outcome.terminal_state, RefundAttemptState::GatewayFailed);
    assert_eq!(outcome.gateway_reference, None);
    assert_eq!(p.gateway.calls.load(Ordering::SeqCst), 1);
    assert!(p.ledger.records.lock().unwrap().is_empty());
    assert!(p.store.released.load(Ordering::SeqCst));
    assert!(p.alerts.alerts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn ledger_failure_after_gateway_success_raises_reconciliation_alert() {
    let transaction = wave_transaction("10000");
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, true);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("10000"),
            reason: "customer complaint".to_string(),
        })
        .await;

    // Money moved but the record write failed: overall failure, gateway
    // reference preserved, claim kept so nobody retries blindly.
    assert!(!outcome.success);
    assert_eq!(outcome.failure_kind.as_deref(), Some("ledger"));
    assert_eq!(outcome.terminal_state, RefundAttemptState::LedgerFailed);
    assert_eq!(outcome.gateway_reference.as_deref(), Some("wave_refund_789"));
    assert_eq!(
        outcome.failure_reason.as_deref(),
        Some("Failed to record the refund in our system")
    );
    assert!(!p.store.released.load(Ordering::SeqCst));

    let alerts = p.alerts.alerts.lock().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].transaction_id, transaction_id);
    assert_eq!(alerts[0].provider_refund_id, "wave_refund_789");
    assert_eq!(alerts[0].amount, dec("10000"));
    // The alert must carry the underlying ledger failure, not the fixed
    // user-facing message.
    assert!(alerts[0].ledger_error.contains("rpc create_refund timed out"));
}

#[tokio::test]
async fn second_concurrent_attempt_loses_the_claim() {
    let transaction = wave_transaction("10000");
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, false);

    let first = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("4000"),
            reason: "first".to_string(),
        })
        .await;
    assert!(first.success);

    // The winning attempt finished with the claim still held (the store
    // only releases on pre-money failures), so a second attempt must lose.
    let second = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("4000"),
            reason: "second".to_string(),
        })
        .await;

    assert!(!second.success);
    assert_eq!(second.failure_kind.as_deref(), Some("concurrent_refund"));
    assert_eq!(p.gateway.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn amount_above_gross_is_rejected_locally() {
    let transaction = wave_transaction("10000");
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, false);

    let outcome = p
        .processor
        .execute_refund(RefundRequest {
            transaction_id,
            requested_amount: dec("15000"),
            reason: "too much".to_string(),
        })
        .await;

    assert!(!outcome.success);
    assert_eq!(outcome.failure_kind.as_deref(), Some("validation"));
    assert_eq!(p.gateway.calls.load(Ordering::SeqCst), 0);
    assert!(!p.store.claimed.load(Ordering::SeqCst));
}

#[tokio::test]
async fn eligibility_endpoint_logic_reports_blockers() {
    let mut transaction = wave_transaction("10000");
    transaction.provider_transaction_id = None;
    transaction.provider_checkout_id = None;
    let transaction_id = transaction.id;
    let p = pipeline(transaction, None, false, false);

    let result = p.processor.eligibility(transaction_id).await.unwrap();
    assert!(!result.eligible);

    let preview = p.processor.preview(transaction_id, dec("1000")).await.unwrap();
    assert_eq!(preview.processing_fee, dec("20.00"));
    assert_eq!(preview.net_amount, dec("980.00"));
}
