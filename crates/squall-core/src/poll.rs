use std::{future::Future, sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

use squall_app::{AppError, Runner};
use squall_control::{ControlPlane, Fetched};
use squall_model::{
    ExecuteResourceOperation, ListResources, Metadata, NextTask, ReportStatus, TaskPayload,
    TaskReport, TaskResponse,
};

use crate::{config::ServeConfig, error::CoreError, translate};

/// What the loop does after one iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Fetch again right away.
    Continue,
    /// Sleep one poll interval first.
    Backoff,
}

/// Fetch, decode, dispatch and report tasks for one App version.
pub struct PollLoop {
    runner: Runner,
    control: Arc<dyn ControlPlane>,
    cfg: ServeConfig,
    span: Span,
}

impl PollLoop {
    pub fn new(runner: Runner, control: Arc<dyn ControlPlane>, cfg: ServeConfig) -> Self {
        let span = info_span!(target: "squall.poll", "poll", app = %runner.app_id(), version = %runner.version());
        Self {
            runner,
            control,
            cfg,
            span,
        }
    }

    /// Run until `shutdown` is cancelled. No error leaves the loop.
    pub async fn run(self, shutdown: CancellationToken) {
        let span = self.span.clone();
        async move {
            info!(target: "squall.poll", "polling started");
            loop {
                let step = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    step = self.step() => step,
                };
                if step == Step::Backoff && !pause(&shutdown, self.cfg.poll_interval).await {
                    break;
                }
            }
            info!(target: "squall.poll", "polling stopped");
        }
        .instrument(span)
        .await
    }

    /// One Fetch -> Decode -> Dispatch -> Report pass.
    pub async fn step(&self) -> Step {
        let fetched = self
            .control
            .next_task(self.runner.key(), self.cfg.fetch_timeout)
            .await;

        let body = match fetched {
            Ok(Fetched::Task(body)) => body,
            Ok(Fetched::Empty) => {
                debug!(target: "squall.poll", "no tasks available");
                return Step::Backoff;
            }
            Ok(Fetched::Status(status)) => {
                warn!(target: "squall.poll", status, "unexpected status from control plane");
                return Step::Backoff;
            }
            Err(e) => {
                warn!(target: "squall.poll", error = %e, "failed to get next task, will retry");
                return Step::Backoff;
            }
        };

        let task = match NextTask::from_json(&body) {
            Ok(task) => task,
            Err(e) => {
                error!(target: "squall.poll", error = %e, "failed to decode task, dropping it");
                return Step::Backoff;
            }
        };

        let task_id = task.task_id.clone();
        let kind = task.task.kind();
        info!(target: "squall.poll", %task_id, kind, "task received");

        let report = match self.dispatch(task).await {
            Ok(response) => TaskReport::ok(task_id.clone(), response),
            Err(e) => {
                warn!(target: "squall.poll", %task_id, kind, error = %e, "task failed");
                TaskReport::error(task_id.clone(), e.to_string())
            }
        };
        let failed = report.status == ReportStatus::Error;

        match self.control.report_task(&report).await {
            Ok(()) => {
                info!(target: "squall.poll", %task_id, status = ?report.status, "task reported");
                if failed { Step::Backoff } else { Step::Continue }
            }
            Err(e) => {
                warn!(target: "squall.poll", %task_id, error = %e, "failed to report task");
                Step::Backoff
            }
        }
    }

    async fn dispatch(&self, task: NextTask) -> Result<TaskResponse, CoreError> {
        match &task.task {
            TaskPayload::ExecuteResourceOperation(op) => self.execute(&task.metadata, op).await,
            TaskPayload::ListResources(list) => self.list(&task.metadata, list).await,
            TaskPayload::ExecuteResourceAction(action) => {
                warn!(target: "squall.poll", action = %action.action, "resource actions are not supported");
                Err(CoreError::Unsupported(task.task.kind()))
            }
        }
    }

    async fn execute(
        &self,
        metadata: &Metadata,
        op: &ExecuteResourceOperation,
    ) -> Result<TaskResponse, CoreError> {
        let request = translate::operation_request(metadata, op)?;
        debug!(target: "squall.poll", operation = %op.operation, resource = %op.resource.kind, "executing resource operation");

        let client = self.runner.client();
        let response = bounded(
            self.cfg.operation_timeout,
            client.execute_resource_operation(request),
        )
        .await?;
        Ok(translate::operation_response(response)?)
    }

    async fn list(&self, metadata: &Metadata, list: &ListResources) -> Result<TaskResponse, CoreError> {
        let request = translate::list_request(metadata, list);
        debug!(target: "squall.poll", resource = %list.resource.kind, next = %list.next, "listing resources");

        let client = self.runner.client();
        let response = bounded(self.cfg.list_timeout, client.list_resources(request)).await?;
        Ok(translate::list_response(response))
    }
}

/// Sleep for `period`; `false` when shutdown came first.
pub(crate) async fn pause(shutdown: &CancellationToken, period: Duration) -> bool {
    tokio::select! {
        _ = shutdown.cancelled() => false,
        _ = tokio::time::sleep(period) => true,
    }
}

pub(crate) async fn bounded<T, F>(limit: Duration, call: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(limit, call)
        .await
        .map_err(|_| AppError::Timeout(limit))?
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{
        collections::VecDeque,
        sync::{
            Mutex,
            atomic::{AtomicUsize, Ordering},
        },
    };

    use async_trait::async_trait;
    use serde_json::json;
    use squall_app::{AppClient, proto};
    use squall_control::ControlError;
    use squall_model::{AppKey, HealthReport};

    use super::*;

    /// Control plane that replays scripted fetch results, then reports an empty queue.
    #[derive(Default)]
    pub(crate) struct FakeControl {
        pub fetches: Mutex<VecDeque<Result<Fetched, ControlError>>>,
        pub fetch_calls: AtomicUsize,
        pub reports: Mutex<Vec<TaskReport>>,
        pub health: Mutex<Vec<HealthReport>>,
        pub fail_reports: bool,
    }

    impl FakeControl {
        pub fn scripted(fetches: Vec<Result<Fetched, ControlError>>) -> Arc<Self> {
            Arc::new(Self {
                fetches: Mutex::new(fetches.into()),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl ControlPlane for FakeControl {
        async fn next_task(&self, _: &AppKey, _: Duration) -> Result<Fetched, ControlError> {
            self.fetch_calls.fetch_add(1, Ordering::SeqCst);
            self.fetches
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Ok(Fetched::Empty))
        }

        async fn report_task(&self, report: &TaskReport) -> Result<(), ControlError> {
            self.reports.lock().unwrap().push(report.clone());
            if self.fail_reports {
                return Err(ControlError::Rejected {
                    status: 500,
                    body: "down".into(),
                });
            }
            Ok(())
        }

        async fn report_health(&self, report: &HealthReport) -> Result<(), ControlError> {
            self.health.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    /// App that echoes operations back as resources and fails when told to.
    #[derive(Default)]
    pub(crate) struct FakeApp {
        pub definitions: Vec<proto::ResourceDefinition>,
        pub health: Vec<(String, i32)>,
        pub fail: bool,
        pub describe_calls: AtomicUsize,
        pub dispatches: AtomicUsize,
        pub health_calls: AtomicUsize,
        pub last_operation: Mutex<Option<proto::ExecuteResourceOperationRequest>>,
    }

    #[async_trait]
    impl AppClient for FakeApp {
        async fn describe(&self) -> Result<proto::DescribeResponse, AppError> {
            self.describe_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(tonic::Status::unavailable("down").into());
            }
            Ok(proto::DescribeResponse {
                resource_definitions: self.definitions.clone(),
            })
        }

        async fn execute_resource_operation(
            &self,
            request: proto::ExecuteResourceOperationRequest,
        ) -> Result<proto::ExecuteResourceOperationResponse, AppError> {
            self.dispatches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(tonic::Status::internal("boom").into());
            }
            let resource = proto::Resource {
                display_name: "created".into(),
                ..request.resource.clone().unwrap_or_default()
            };
            *self.last_operation.lock().unwrap() = Some(request);
            Ok(proto::ExecuteResourceOperationResponse {
                resource: Some(resource),
            })
        }

        async fn list_resources(
            &self,
            request: proto::ListResourcesRequest,
        ) -> Result<proto::ListResourcesResponse, AppError> {
            self.dispatches.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(tonic::Status::internal("boom").into());
            }
            let kind = request.resource.map(|r| r.r#type).unwrap_or_default();
            Ok(proto::ListResourcesResponse {
                resources: vec![proto::Resource {
                    r#type: kind,
                    external_id: "r1".into(),
                    ..Default::default()
                }],
                next: format!("{}+1", request.next),
            })
        }

        async fn health_check(
            &self,
            request: proto::HealthCheckRequest,
        ) -> Result<proto::HealthCheckResponse, AppError> {
            self.health_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(tonic::Status::internal("boom").into());
            }
            let status = self
                .health
                .iter()
                .find(|(kind, _)| *kind == request.r#type)
                .map(|(_, status)| *status)
                .unwrap_or_default();
            Ok(proto::HealthCheckResponse {
                status,
                message: format!("{} checked", request.r#type),
            })
        }
    }

    pub(crate) fn runner(app: Arc<FakeApp>) -> Runner {
        Runner::new(AppKey::new("app1", "v1"), app)
    }

    fn body(task: serde_json::Value) -> Result<Fetched, ControlError> {
        Ok(Fetched::Task(task.to_string()))
    }

    fn create_task() -> Result<Fetched, ControlError> {
        body(json!({
            "task_id": "t-1",
            "metadata": {"project_id": "p"},
            "task": {
                "request_type": "execute_resource_operation",
                "operation": "create",
                "resource": {"type": "database"},
                "input": {"name": "orders"}
            }
        }))
    }

    fn poll(app: &Arc<FakeApp>, control: &Arc<FakeControl>) -> PollLoop {
        PollLoop::new(runner(app.clone()), control.clone(), ServeConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn survives_failures_and_dispatches_once() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![
            Err(ControlError::InvalidResponse("connection reset".into())),
            Ok(Fetched::Empty),
            body(json!({"task_id": "t-0", "task": {"request_type": "reboot"}})),
            create_task(),
        ]);
        let poll = poll(&app, &control);

        let steps = [
            poll.step().await,
            poll.step().await,
            poll.step().await,
            poll.step().await,
        ];
        assert_eq!(
            steps,
            [Step::Backoff, Step::Backoff, Step::Backoff, Step::Continue]
        );
        assert_eq!(app.dispatches.load(Ordering::SeqCst), 1);

        let reports = control.reports.lock().unwrap();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].task_id, "t-1");
        assert_eq!(reports[0].status, ReportStatus::Ok);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_keeps_polling_until_shutdown() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![
            Err(ControlError::InvalidResponse("connection reset".into())),
            Ok(Fetched::Empty),
            body(json!({"garbage": true})),
            create_task(),
        ]);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poll(&app, &control).run(shutdown.clone()));

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(!handle.is_finished());
        assert!(control.fetch_calls.load(Ordering::SeqCst) > 4);
        assert_eq!(app.dispatches.load(Ordering::SeqCst), 1);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failures_are_spaced_by_poll_interval() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![]);
        let shutdown = CancellationToken::new();
        let handle = tokio::spawn(poll(&app, &control).run(shutdown.clone()));

        // Fetches at 0s, 5s, 10s.
        tokio::time::sleep(Duration::from_millis(12_500)).await;
        assert_eq!(control.fetch_calls.load(Ordering::SeqCst), 3);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn operation_result_is_reported_as_resource() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![create_task()]);
        assert_eq!(poll(&app, &control).step().await, Step::Continue);

        let sent = app.last_operation.lock().unwrap().clone().unwrap();
        assert_eq!(sent.operation, proto::ResourceOperation::Create as i32);
        assert_eq!(sent.metadata.unwrap().project_id, "p");

        let reports = control.reports.lock().unwrap();
        let Some(TaskResponse::ExecuteResourceOperation { resource }) = &reports[0].response else {
            panic!("expected operation response");
        };
        assert_eq!(resource.kind, "database");
        assert_eq!(resource.display_name, "created");
        let wire = serde_json::to_value(&reports[0]).unwrap();
        assert_eq!(wire["response"]["response_type"], "execute_resource_operation");
    }

    #[tokio::test]
    async fn list_result_keeps_cursor() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![body(json!({
            "task_id": "t-2",
            "task": {"request_type": "list_resources", "resource": {"type": "bucket"}, "next": "c1"}
        }))]);
        assert_eq!(poll(&app, &control).step().await, Step::Continue);

        let reports = control.reports.lock().unwrap();
        let Some(TaskResponse::ListResources { resources, next }) = &reports[0].response else {
            panic!("expected list response");
        };
        assert_eq!(next, "c1+1");
        assert_eq!(resources[0].kind, "bucket");
    }

    #[tokio::test]
    async fn rpc_failure_is_reported_as_task_error() {
        let app = Arc::new(FakeApp {
            fail: true,
            ..Default::default()
        });
        let control = FakeControl::scripted(vec![create_task()]);
        assert_eq!(poll(&app, &control).step().await, Step::Backoff);

        let reports = control.reports.lock().unwrap();
        assert_eq!(reports[0].status, ReportStatus::Error);
        assert!(reports[0].message.as_deref().unwrap().contains("boom"));
        assert!(reports[0].response.is_none());
    }

    #[tokio::test]
    async fn unknown_operation_is_reported_without_dispatch() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![body(json!({
            "task_id": "t-3",
            "task": {
                "request_type": "execute_resource_operation",
                "operation": "explode",
                "resource": {"type": "database"}
            }
        }))]);
        poll(&app, &control).step().await;

        assert_eq!(app.dispatches.load(Ordering::SeqCst), 0);
        let reports = control.reports.lock().unwrap();
        assert_eq!(reports[0].status, ReportStatus::Error);
        assert_eq!(reports[0].message.as_deref(), Some("unsupported operation: explode"));
    }

    #[tokio::test]
    async fn resource_action_is_reported_as_unsupported() {
        let app = Arc::new(FakeApp::default());
        let control = FakeControl::scripted(vec![body(json!({
            "task_id": "t-4",
            "task": {
                "request_type": "execute_resource_action",
                "action": "restart",
                "resource": {"type": "database", "external_id": "db-1"}
            }
        }))]);
        poll(&app, &control).step().await;

        assert_eq!(app.dispatches.load(Ordering::SeqCst), 0);
        let reports = control.reports.lock().unwrap();
        assert_eq!(reports[0].task_id, "t-4");
        assert_eq!(reports[0].status, ReportStatus::Error);
        assert_eq!(
            reports[0].message.as_deref(),
            Some("unsupported task kind: execute_resource_action")
        );
    }

    #[tokio::test]
    async fn report_failure_backs_off() {
        let app = Arc::new(FakeApp::default());
        let control = Arc::new(FakeControl {
            fetches: Mutex::new(vec![create_task()].into()),
            fail_reports: true,
            ..Default::default()
        });
        assert_eq!(poll(&app, &control).step().await, Step::Backoff);
        assert_eq!(control.reports.lock().unwrap().len(), 1);
    }
}
