//! ### English
//! Capture thread: owns the opened device and processes commands strictly in order.
//!
//! ### 中文
//! 采集线程：持有已打开的设备，并严格按顺序处理命令。

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

use crossbeam_channel as channel;
use dpi::PhysicalSize;

use crate::engine::error::{DeviceError, PipelineError, PipelineResult};
use crate::engine::frame::FrameSlot;

use super::command::CaptureCommand;
use super::controller::{CaptureContext, CaptureState};
use super::device::{CaptureDevice, DeviceConfig};
use super::rotation::display_orientation;
use super::selection::resolve_config;

/// ### English
/// Capture thread entry function. Returns after processing `Stop`, or when every sender is gone.
///
/// ### 中文
/// 采集线程入口函数。处理完 `Stop` 或所有发送端都被丢弃后返回。
pub(super) fn run_capture_thread(
    context: CaptureContext,
    state: Arc<AtomicU8>,
    command_rx: channel::Receiver<CaptureCommand>,
    ready_tx: channel::Sender<()>,
) {
    tracing::debug!("capture thread started");
    let _ = ready_tx.send(());

    let mut session: Option<CaptureSession> = None;
    while let Ok(command) = command_rx.recv() {
        tracing::trace!(?command, "capture command");
        match command {
            CaptureCommand::Start { requested } => {
                if session.is_some() {
                    tracing::debug!("capture device already open; start ignored");
                    continue;
                }
                state.store(CaptureState::Opening as u8, Ordering::Release);
                match CaptureSession::open(&context, requested) {
                    Ok(opened) => {
                        session = Some(opened);
                        state.store(CaptureState::Previewing as u8, Ordering::Release);
                    }
                    Err(err) => {
                        state.store(CaptureState::Idle as u8, Ordering::Release);
                        tracing::error!(%err, "capture start failed");
                        context.observer.on_prepared_error(&err);
                    }
                }
            }
            CaptureCommand::Stop { done } => {
                if let Some(session) = session.take() {
                    session.close();
                }
                state.store(CaptureState::Idle as u8, Ordering::Release);
                if let Some(done) = done {
                    let _ = done.send(());
                }
                break;
            }
        }
    }

    if let Some(session) = session.take() {
        session.close();
        state.store(CaptureState::Idle as u8, Ordering::Release);
    }
    tracing::debug!("capture thread finished");
}

/// ### English
/// One open device, configured and streaming into the frame slot.
///
/// Closing the session revokes the slot's producers before the device is stopped, so frames the
/// device still delivers through a retained producer never reach the slot.
///
/// ### 中文
/// 一个已打开、已配置并向帧槽推流的设备。
///
/// 关闭会话时先撤销帧槽的生产者再停止设备，设备经由残留生产者送来的帧不会再进入帧槽。
struct CaptureSession {
    device: Box<dyn CaptureDevice>,
    config: DeviceConfig,
    slot: Arc<FrameSlot>,
}

impl CaptureSession {
    fn open(context: &CaptureContext, requested: PhysicalSize<u32>) -> PipelineResult<Self> {
        let mut device = context
            .backend
            .open(context.camera_id)
            .map_err(|err| PipelineError::DeviceUnavailable(err.to_string()))?;

        match configure(device.as_mut(), context, requested) {
            Ok(config) => Ok(Self {
                device,
                config,
                slot: context.slot.clone(),
            }),
            Err(err) => {
                context.slot.revoke_producers();
                device.release();
                Err(err)
            }
        }
    }

    fn close(mut self) {
        tracing::debug!(preview = ?self.config.preview_size, "releasing capture device");
        self.slot.revoke_producers();
        self.device.stop_streaming();
        self.device.release();
    }
}

fn configure(
    device: &mut dyn CaptureDevice,
    context: &CaptureContext,
    requested: PhysicalSize<u32>,
) -> PipelineResult<DeviceConfig> {
    let rejected = |err: DeviceError| PipelineError::DeviceConfigRejected(err.to_string());

    let capabilities = device.capabilities().map_err(rejected)?;
    let Some(mut config) = resolve_config(&capabilities, requested) else {
        return Err(PipelineError::DeviceConfigRejected(
            "device advertises no preview sizes".to_string(),
        ));
    };
    if config.focus_mode.is_none() {
        tracing::info!("camera does not support autofocus");
    }

    let degrees = display_orientation(device.info(), context.display.rotation());
    let preview_size = device.configure(&config).map_err(rejected)?;
    device.set_display_orientation(degrees).map_err(rejected)?;
    config.preview_size = preview_size;
    tracing::info!(
        fps = ?config.fps_range,
        preview = ?preview_size,
        picture = ?config.picture_size,
        focus = ?config.focus_mode,
        rotation = degrees,
        "capture device configured"
    );

    context.preview.set_display_rotation(degrees);
    context.preview.set_target_size(preview_size.width, preview_size.height);
    context.observer.on_preview_size_resolved(preview_size);

    context.slot.set_default_buffer_size(preview_size);
    let Some(producer) = context.slot.producer() else {
        return Err(PipelineError::DeviceConfigRejected(
            "no preview surface to bind".to_string(),
        ));
    };
    device.bind_output(producer).map_err(rejected)?;
    device.start_streaming().map_err(rejected)?;
    Ok(config)
}
