use crate::runner::{ProcessOutput, ToolRunner};
use curveadj_schema::InvocationStatus;
use futures::future::BoxFuture;
use std::{
    collections::VecDeque,
    path::Path,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Records every invocation and replies with queued statuses, exiting with 0 once the queue is empty.
#[derive(Clone, Default)]
pub struct MockRunner {
    state: Arc<Mutex<MockState>>,
}

#[derive(Default)]
struct MockState {
    calls: Vec<Vec<String>>,
    statuses: VecDeque<InvocationStatus>,
}

impl MockRunner {
    pub fn push_status(&self, status: InvocationStatus) {
        self.state.lock().unwrap().statuses.push_back(status);
    }

    pub fn calls(&self) -> Vec<Vec<String>> {
        self.state.lock().unwrap().calls.clone()
    }
}

impl ToolRunner for MockRunner {
    fn run<'a>(
        &'a self,
        _exec: &'a Path,
        args: &'a [String],
        _timeout: Duration,
    ) -> BoxFuture<'a, ProcessOutput> {
        let status = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(args.to_vec());
            state
                .statuses
                .pop_front()
                .unwrap_or(InvocationStatus::Exited { code: 0 })
        };

        Box::pin(async move {
            ProcessOutput {
                stdout: "mock output".to_owned(),
                stderr: if status.success() {
                    String::new()
                } else {
                    "mock failure".to_owned()
                },
                status,
            }
        })
    }
}
