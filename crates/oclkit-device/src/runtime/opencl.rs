//! OpenCL 原生运行时

use cl3::types::{cl_context_properties, cl_device_id, cl_platform_id};
use oclkit_core::DeviceKind;
use opencl3::device::{CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_CPU, CL_DEVICE_TYPE_GPU, Device as ClDevice};
use opencl3::error_codes::ClError;
use opencl3::platform::{Platform as ClPlatform, get_platforms};

use super::{ComputeRuntime, DeviceDescriptor, PlatformDescriptor, RuntimeError, RuntimeResult};
use crate::platform::{DeviceId, PlatformId};

impl From<ClError> for RuntimeError {
    fn from(e: ClError) -> Self {
        RuntimeError::Driver {
            code: e.0,
            message: e.to_string(),
        }
    }
}

/// 通过 ICD 加载器访问的 OpenCL 运行时
#[derive(Debug, Default)]
pub struct OpenClRuntime;

impl OpenClRuntime {
    pub fn new() -> Self {
        Self
    }

    fn cl_platform(id: PlatformId) -> ClPlatform {
        ClPlatform::new(id.0 as usize as cl_platform_id)
    }

    fn describe_device(id: cl_device_id) -> RuntimeResult<DeviceDescriptor> {
        let device = ClDevice::new(id);
        let dev_type = device.dev_type()?;
        let kind = if dev_type & CL_DEVICE_TYPE_GPU != 0 {
            DeviceKind::Gpu
        } else if dev_type & CL_DEVICE_TYPE_CPU != 0 {
            DeviceKind::Cpu
        } else {
            // 加速器以及自定义设备
            DeviceKind::Accelerator
        };

        Ok(DeviceDescriptor {
            id: DeviceId(id as usize as u64),
            name: device.name()?,
            vendor: device.vendor()?,
            kind,
            compute_units: device.max_compute_units()?,
            global_mem_bytes: device.global_mem_size()?,
        })
    }
}

impl ComputeRuntime for OpenClRuntime {
    fn name(&self) -> &'static str {
        "opencl"
    }

    fn platforms(&self) -> RuntimeResult<Vec<PlatformDescriptor>> {
        get_platforms()?
            .into_iter()
            .map(|platform| {
                Ok(PlatformDescriptor {
                    id: PlatformId(platform.id() as usize as u64),
                    name: platform.name()?,
                    vendor: platform.vendor()?,
                })
            })
            .collect()
    }

    fn devices(&self, platform: &PlatformDescriptor) -> RuntimeResult<Vec<DeviceDescriptor>> {
        Self::cl_platform(platform.id)
            .get_devices(CL_DEVICE_TYPE_ALL)?
            .into_iter()
            .map(Self::describe_device)
            .collect()
    }

    fn devices_for_gl_context(
        &self,
        platform: PlatformId,
        gl_context: usize,
        display: usize,
    ) -> RuntimeResult<Vec<DeviceId>> {
        let mut properties: [cl_context_properties; 7] = [
            cl3::gl::CL_GL_CONTEXT_KHR as cl_context_properties,
            gl_context as cl_context_properties,
            cl3::gl::CL_GLX_DISPLAY_KHR as cl_context_properties,
            display as cl_context_properties,
            cl3::context::CL_CONTEXT_PLATFORM as cl_context_properties,
            platform.0 as usize as cl_context_properties,
            0,
        ];

        let info = cl3::gl::get_gl_context_info_khr(
            properties.as_mut_ptr(),
            cl3::gl::CL_DEVICES_FOR_GL_CONTEXT_KHR,
        )
        .map_err(|code| RuntimeError::Driver {
            code,
            message: "clGetGLContextInfoKHR failed".to_string(),
        })?;

        Ok(info
            .to_vec_intptr()
            .into_iter()
            .map(|id| DeviceId(id as usize as u64))
            .collect())
    }
}
