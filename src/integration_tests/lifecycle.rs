//! Launch, exit, stop and relaunch of a well-behaved engine.

use std::sync::mpsc::RecvTimeoutError;
use std::sync::{Arc, Barrier};
use std::time::Duration;

use crate::drive::SYSTEM_REG_CONTENT;
use crate::input::{
    EventSink, InputBridge, ManualClock, NormalizedPointerEvent, SurfacePoint, SurfaceSize, buttons,
};
use crate::runtime::{EngineState, LaunchError};

use super::util::{self, PATIENCE, Sandbox};

const REPORT_AND_FAIL: &str = r#"
echo "prefix=$WINEPREFIX"
echo "dynarec=$BOX64_DYNAREC"
echo "hud=$DXVK_HUD"
echo "home=${HOME-unset}"
echo "cwd=$(pwd -P)"
echo "complaint" >&2
exit 3
"#;

fn long_running(marker: &std::path::Path) -> String {
    format!(
        "echo launched >> '{}'\nexec /bin/sleep 30",
        marker.display()
    )
}

/// The engine runs inside the bootstrapped sandbox with the engine
/// environment, and its own exit is reported with its code.
#[test]
fn engine_runs_in_sandbox_and_exit_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.install_engine(REPORT_AND_FAIL);
    let supervisor = sandbox.supervisor();
    let output = supervisor.take_output().unwrap();
    assert!(supervisor.take_output().is_none());

    supervisor.launch().unwrap();
    assert_eq!(supervisor.wait_for_exit(PATIENCE), Some(3));
    assert_eq!(supervisor.state(), EngineState::Exited { code: 3 });
    assert_eq!(supervisor.status(), "Engine exited with code: 3");

    let output = util::read_to_end(output);
    let root = sandbox.root.path();
    assert!(output.contains(&format!("prefix={}\n", root.display())), "{output}");
    assert!(output.contains("dynarec=1\n"), "{output}");
    assert!(output.contains("hud=compiler\n"), "{output}");
    assert!(output.contains("home=unset\n"), "{output}");
    assert!(output.contains("complaint\n"), "{output}");
    let cwd = fs_err::canonicalize(root).unwrap();
    assert!(output.contains(&format!("cwd={}\n", cwd.display())), "{output}");
    // The finished tap makes room for a new one.
    assert!(supervisor.take_output().is_some());

    assert!(sandbox.root.primary_subtree().is_dir());
    assert!(sandbox.root.desktop().is_dir());
    assert_eq!(
        fs_err::read_to_string(sandbox.root.system_reg()).unwrap(),
        SYSTEM_REG_CONTENT
    );
    assert_eq!(
        fs_err::read_link(sandbox.root.removable_drive()).unwrap(),
        sandbox.downloads
    );
}

/// Nobody reads the output, yet a chatty engine is never blocked on a full
/// pipe.
#[test]
fn unread_output_does_not_stall_the_engine() {
    let sandbox = Sandbox::new();
    let line = "x".repeat(64);
    sandbox.install_engine(&format!(
        "i=0\nwhile [ $i -lt 4096 ]; do echo {line}; i=$((i+1)); done\nexit 0"
    ));
    let supervisor = sandbox.supervisor();

    supervisor.launch().unwrap();
    assert_eq!(supervisor.wait_for_exit(PATIENCE), Some(0));
}

/// A tap taken while the engine runs sees the rest of its output.
#[test]
fn output_can_be_tapped_while_running() {
    let sandbox = Sandbox::new();
    let gate = sandbox.scratch("gate");
    sandbox.install_engine(&format!(
        "echo early\nwhile [ ! -e '{}' ]; do /bin/sleep 0.05; done\necho late\nexit 0",
        gate.display()
    ));
    let supervisor = sandbox.supervisor();

    supervisor.launch().unwrap();
    let output = supervisor.take_output().unwrap();
    fs_err::write(&gate, "").unwrap();
    assert_eq!(supervisor.wait_for_exit(PATIENCE), Some(0));

    let output = util::read_to_end(output);
    assert!(output.ends_with("late\n"), "{output}");
}

#[test]
fn clean_exit_reports_success() {
    let sandbox = Sandbox::new();
    sandbox.install_engine("exit 0");
    let supervisor = sandbox.supervisor();

    supervisor.launch().unwrap();
    assert_eq!(supervisor.wait_for_exit(PATIENCE), Some(0));
    assert_eq!(supervisor.state(), EngineState::Exited { code: 0 });
    assert_eq!(supervisor.status(), "Engine completed successfully");
}

/// Every state change reaches subscribers in the order it happened.
#[test]
fn events_arrive_in_order() {
    let sandbox = Sandbox::new();
    sandbox.install_engine("exit 0");
    let supervisor = sandbox.supervisor();
    let rx = supervisor.subscribe();

    supervisor.launch().unwrap();
    let events = util::events_until(&rx, |state| matches!(state, EngineState::Exited { .. }));
    let statuses: Vec<&str> = events.iter().map(|e| e.status.as_str()).collect();

    assert_eq!(events[0].state, EngineState::Launching);
    assert_eq!(statuses[0], "Launching Windows engine...");
    assert!(statuses[1].starts_with("Found winkor_engine at "), "{statuses:?}");
    assert_eq!(statuses[2], "Execute permissions set");
    assert_eq!(statuses[3], "Creating Windows directory structure...");
    assert_eq!(
        statuses.iter().filter(|s| s.starts_with("Created ")).count(),
        crate::drive::REQUIRED_DIRECTORIES.len()
    );

    let ready = statuses
        .iter()
        .position(|s| *s == "Wine environment ready")
        .unwrap();
    let link = statuses
        .iter()
        .position(|s| *s == "Creating D: drive link...")
        .unwrap();
    let reg = statuses.iter().position(|s| *s == "Writing system.reg...").unwrap();
    assert!(link < reg && reg < ready, "{statuses:?}");
    assert!(events[..=ready].iter().all(|e| e.state == EngineState::Launching));

    let running = &events[ready + 1];
    let EngineState::Running { pid } = running.state else {
        panic!("expected running after ready, got {running:?}");
    };
    assert_eq!(running.status, format!("Windows engine launched (pid {pid})"));

    assert_eq!(events.len(), ready + 3);
    let last = events.last().unwrap();
    assert_eq!(last.state, EngineState::Exited { code: 0 });
    assert_eq!(last.status, "Engine completed successfully");
}

/// A second launch while running spawns nothing and publishes nothing.
#[test]
fn second_launch_while_running_is_rejected() {
    let sandbox = Sandbox::new();
    let marker = sandbox.scratch("launches");
    sandbox.install_engine(&long_running(&marker));
    let supervisor = sandbox.supervisor();

    supervisor.launch().unwrap();
    util::eventually("the engine to start", || marker.exists());
    let state = supervisor.state();
    assert!(matches!(state, EngineState::Running { .. }));

    let rx = supervisor.subscribe();
    assert!(matches!(supervisor.launch(), Err(LaunchError::AlreadyActive)));
    assert_eq!(supervisor.state(), state);
    assert!(rx.try_recv().is_err());

    supervisor.stop();
    assert_eq!(fs_err::read_to_string(&marker).unwrap(), "launched\n");
}

/// Racing launches from many threads start exactly one engine.
#[test]
fn concurrent_launches_spawn_once() {
    const THREADS: usize = 8;
    let sandbox = Sandbox::new();
    let marker = sandbox.scratch("launches");
    sandbox.install_engine(&long_running(&marker));
    let supervisor = Arc::new(sandbox.supervisor());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let supervisor = supervisor.clone();
            let barrier = barrier.clone();
            std::thread::spawn(move || {
                barrier.wait();
                supervisor.launch()
            })
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(results.iter().filter(|res| res.is_ok()).count(), 1);
    let rejected = results
        .iter()
        .filter(|res| matches!(res, Err(LaunchError::AlreadyActive)))
        .count();
    assert_eq!(rejected, THREADS - 1, "{results:?}");

    util::eventually("the engine to start", || marker.exists());
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(fs_err::read_to_string(&marker).unwrap(), "launched\n");
    supervisor.stop();
}

#[test]
fn stop_when_idle_is_a_no_op() {
    let sandbox = Sandbox::new();
    let supervisor = sandbox.supervisor();
    let rx = supervisor.subscribe();

    supervisor.stop();
    assert_eq!(supervisor.state(), EngineState::Idle);
    assert_eq!(supervisor.status(), "Ready to launch Windows");
    assert!(rx.try_recv().is_err());
}

/// Stopping returns to idle at once and the process goes away, which the
/// output stream shows by reaching end-of-file.
#[test]
fn stop_terminates_the_engine() {
    let sandbox = Sandbox::new();
    let marker = sandbox.scratch("launches");
    sandbox.install_engine(&long_running(&marker));
    let supervisor = sandbox.supervisor();

    supervisor.launch().unwrap();
    util::eventually("the engine to start", || marker.exists());
    let output = supervisor.take_output().unwrap();
    let rx = supervisor.subscribe();

    supervisor.stop();
    assert_eq!(supervisor.state(), EngineState::Idle);
    assert_eq!(supervisor.status(), "Engine stopped");
    assert_eq!(util::read_to_end(output), "");

    let events: Vec<_> = rx.try_iter().collect();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0].state, EngineState::Exiting { .. }));
    assert_eq!(events[1].state, EngineState::Idle);

    // The watcher must not overwrite the stopped state with an exit.
    std::thread::sleep(Duration::from_millis(200));
    assert_eq!(supervisor.state(), EngineState::Idle);
    assert_eq!(supervisor.wait_for_exit(Duration::from_millis(10)), None);
}

#[test]
fn relaunch_after_exit_and_after_stop() {
    let sandbox = Sandbox::new();
    sandbox.install_engine("exit 0");
    let supervisor = sandbox.supervisor();

    supervisor.launch().unwrap();
    assert_eq!(supervisor.wait_for_exit(PATIENCE), Some(0));
    supervisor.launch().unwrap();
    assert_eq!(supervisor.wait_for_exit(PATIENCE), Some(0));

    let marker = sandbox.scratch("launches");
    sandbox.install_engine(&long_running(&marker));
    supervisor.launch().unwrap();
    util::eventually("the engine to start", || marker.exists());
    supervisor.stop();
    supervisor.launch().unwrap();
    util::eventually("the second start", || {
        fs_err::read_to_string(&marker).is_ok_and(|text| text.lines().count() == 2)
    });
    supervisor.stop();
}

/// The event channel disconnects once the supervisor and its sinks are gone.
#[test]
fn input_channel_closes_with_the_supervisor() {
    let sandbox = Sandbox::new();
    let supervisor = sandbox.supervisor();
    let events = supervisor.take_input_events().unwrap();
    let mut sink = supervisor.input_sink();

    drop(supervisor);
    let event = NormalizedPointerEvent {
        button_mask: buttons::PRIMARY,
        ..Default::default()
    };
    sink.deliver(&event);
    assert_eq!(events.recv_timeout(PATIENCE).unwrap(), event);

    drop(sink);
    assert_eq!(
        events.recv_timeout(PATIENCE),
        Err(RecvTimeoutError::Disconnected)
    );
}

/// Pointer events fed into the supervisor's sink come out of its channel.
#[test]
fn input_reaches_the_engine_channel() {
    let sandbox = Sandbox::new();
    let supervisor = sandbox.supervisor();
    let events = supervisor.take_input_events().unwrap();
    assert!(supervisor.take_input_events().is_none());

    let mut bridge = InputBridge::with_clock(supervisor.input_sink(), ManualClock::default());
    bridge
        .on_tap(SurfacePoint::new(100.0, 25.0), SurfaceSize::new(200.0, 100.0))
        .unwrap();
    // The release is still queued.
    assert_eq!(bridge.run_due_timers(), 0);

    let received: Vec<_> = events.try_iter().collect();
    assert_eq!(received.len(), 2);
    assert_eq!(received[0].button_mask, buttons::NONE);
    assert_eq!(received[1].button_mask, buttons::PRIMARY);
    assert_eq!((received[1].ndc_x, received[1].ndc_y), (0.0, 0.5));
}
