use std::sync::Mutex;
use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};

/// The game process a detection session follows.
pub trait TargetProcess: Send + Sync {
    fn pid(&self) -> u32;

    /// Cheap liveness probe, called once per analysis pass.
    fn has_exited(&self) -> bool;
}

#[derive(Debug)]
pub struct SystemProcess {
    pid: Pid,
    system: Mutex<System>,
}

impl SystemProcess {
    pub fn new(pid: u32) -> Self {
        Self {
            pid: Pid::from_u32(pid),
            system: Mutex::new(System::new()),
        }
    }
}

impl TargetProcess for SystemProcess {
    fn pid(&self) -> u32 {
        self.pid.as_u32()
    }

    fn has_exited(&self) -> bool {
        let Ok(mut system) = self.system.lock() else {
            tracing::warn!(event = "process_probe_lock_poisoned", pid = self.pid.as_u32());
            return false;
        };
        system.refresh_processes(ProcessesToUpdate::Some(&[self.pid]), true);
        match system.process(self.pid) {
            Some(process) => matches!(process.status(), ProcessStatus::Zombie | ProcessStatus::Dead),
            None => true,
        }
    }
}

#[cfg(test)]
#[path = "../tests/process_tests.inc"]
mod process_tests;
