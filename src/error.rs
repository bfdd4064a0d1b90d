//! dlog 错误类型
//!
//! 管理类接口（过滤器、后端、初始化）返回 [`DlogResult`]，
//! 可通过 [`DlogError::to_errno()`] 转换为系统错误码。
//! 日志输出路径本身从不返回错误。

/// dlog 错误类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DlogError {
    PermissionDenied, // -EPERM(1): 日志系统尚未初始化
    NotFound,         // -ENOENT(2): 标签过滤器 / 后端不存在
    NoMemory,         // -ENOMEM(12): 分配过滤器条目或环形缓冲区失败
    InvalidArgument,  // -EINVAL(22): 参数非法（空标签、级别越界等）
    InvalidConfig,    // -EINVAL(22): 配置非法，初始化中止
    TaskSpawnFailed,  // -EAGAIN(11): 无法创建异步输出任务
    SemaphoreFailed,  // -EIO(5): 信号量原语失败
}

impl DlogError {
    /// 转换为系统调用错误码（负数）
    pub fn to_errno(&self) -> isize {
        match self {
            DlogError::PermissionDenied => -1,
            DlogError::NotFound => -2,
            DlogError::SemaphoreFailed => -5,
            DlogError::TaskSpawnFailed => -11,
            DlogError::NoMemory => -12,
            DlogError::InvalidArgument => -22,
            DlogError::InvalidConfig => -22,
        }
    }
}

impl core::fmt::Display for DlogError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            DlogError::PermissionDenied => "logger not initialized",
            DlogError::NotFound => "not found",
            DlogError::NoMemory => "out of memory",
            DlogError::InvalidArgument => "invalid argument",
            DlogError::InvalidConfig => "invalid configuration",
            DlogError::TaskSpawnFailed => "failed to spawn drain task",
            DlogError::SemaphoreFailed => "semaphore operation failed",
        };
        f.write_str(msg)
    }
}

/// dlog 管理接口的返回类型
pub type DlogResult<T> = Result<T, DlogError>;

#[cfg(test)]
mod tests {
    use super::*;

    test_case!(test_errno_mapping, {
        kassert!(DlogError::PermissionDenied.to_errno() == -1);
        kassert!(DlogError::NotFound.to_errno() == -2);
        kassert!(DlogError::NoMemory.to_errno() == -12);
        kassert!(DlogError::InvalidConfig.to_errno() == DlogError::InvalidArgument.to_errno());
    });

    test_case!(test_display, {
        let msg = alloc::format!("{}", DlogError::PermissionDenied);
        kassert!(msg == "logger not initialized");
    });
}
