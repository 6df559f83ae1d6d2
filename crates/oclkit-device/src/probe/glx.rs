//! GLX 上的 OpenGL 互操作检测
//!
//! 创建一个最小的 GLX 上下文，向运行时查询能与之关联的设备。

use std::os::raw::{c_int, c_void};
use std::ptr;
use std::sync::Arc;
use tracing::info;
use x11::{glx, xlib};

use super::{CapabilityProbe, ProbeError, ProbeResult};
use crate::platform::Device;
use crate::runtime::ComputeRuntime;

/// 临时 GLX 上下文，离开作用域时销毁
struct GlxContext {
    display: *mut xlib::Display,
    context: glx::GLXContext,
}

impl GlxContext {
    fn create() -> ProbeResult<Self> {
        let mut attributes: [c_int; 10] = [
            glx::GLX_RGBA,
            glx::GLX_RED_SIZE,
            1,
            glx::GLX_GREEN_SIZE,
            1,
            glx::GLX_BLUE_SIZE,
            1,
            glx::GLX_DEPTH_SIZE,
            12,
            0,
        ];

        unsafe {
            let display = xlib::XOpenDisplay(ptr::null());
            if display.is_null() {
                return Err(ProbeError::GraphicsSubsystemUnavailable(
                    "could not open X display".to_string(),
                ));
            }

            let visual = glx::glXChooseVisual(
                display,
                xlib::XDefaultScreen(display),
                attributes.as_mut_ptr(),
            );
            if visual.is_null() {
                xlib::XCloseDisplay(display);
                return Err(ProbeError::GraphicsSubsystemUnavailable(
                    "no RGBA visual with depth buffer".to_string(),
                ));
            }

            let context = glx::glXCreateContext(display, visual, ptr::null_mut(), xlib::True);
            xlib::XFree(visual as *mut c_void);

            if context.is_null() {
                xlib::XCloseDisplay(display);
                return Err(ProbeError::GraphicsSubsystemUnavailable(
                    "could not create a GL 2.1 context, please check your graphics drivers"
                        .to_string(),
                ));
            }

            Ok(Self { display, context })
        }
    }
}

impl Drop for GlxContext {
    fn drop(&mut self) {
        unsafe {
            glx::glXDestroyContext(self.display, self.context);
            xlib::XCloseDisplay(self.display);
        }
    }
}

/// GLX 互操作检测器
pub struct GlxInteropProbe {
    runtime: Arc<dyn ComputeRuntime>,
}

impl GlxInteropProbe {
    pub fn new(runtime: Arc<dyn ComputeRuntime>) -> Self {
        Self { runtime }
    }
}

impl CapabilityProbe for GlxInteropProbe {
    fn name(&self) -> &'static str {
        "glx"
    }

    fn has_graphics_interop(&self, device: &Device) -> ProbeResult<bool> {
        let gl = GlxContext::create()?;

        let devices = self
            .runtime
            .devices_for_gl_context(device.platform, gl.context as usize, gl.display as usize)
            .map_err(|e| ProbeError::Query(e.to_string()))?;

        info!(
            "There are {} devices that can be associated with the GL context",
            devices.len()
        );

        Ok(devices.contains(&device.id))
    }
}
