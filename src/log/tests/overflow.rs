// src/log/tests/overflow.rs

use super::*;

// 512 字节的环形缓冲区只有 3 个块描述符
const SMALL_BUF: usize = 512;

test_case!(test_full_ring_drops_without_blocking, {
    let logger = new_logger(async_config(SMALL_BUF));
    let backend = attach(&logger, MemoryBackend::full("mem"));

    const TOTAL: usize = 10;
    for i in 0..TOTAL {
        test_log!(logger, LogLevel::Info, "OVF", "line {}", i);
    }

    kassert!(logger.dropped_count() == TOTAL - 3);
    logger.flush();

    // 只有放得下的行被输出，被丢弃的行不会出现
    kassert!(backend.text_lines() == ["I/OVF: line 0\r\n", "I/OVF: line 1\r\n", "I/OVF: line 2\r\n"]);
});

test_case!(test_overflow_warning_is_latched, {
    let logger = new_logger(async_config(SMALL_BUF));
    let _backend = attach(&logger, MemoryBackend::full("mem"));

    for i in 0..20 {
        test_log!(logger, LogLevel::Info, "OVF", "line {}", i);
    }
    kassert!(logger.overflow_warned());
    kassert!(mock::console().matches("no enough buffer").count() == 1);

    // 排空之后再溢出也不会重复告警
    logger.flush();
    for i in 0..20 {
        test_log!(logger, LogLevel::Info, "OVF", "again {}", i);
    }
    kassert!(mock::console().matches("no enough buffer").count() == 1);

    // 重新打开后可以再次告警
    logger.reset_warnings();
    for i in 0..5 {
        test_log!(logger, LogLevel::Info, "OVF", "third {}", i);
    }
    kassert!(mock::console().matches("no enough buffer").count() == 2);
});

test_case!(test_ring_usable_after_overflow, {
    let logger = new_logger(async_config(SMALL_BUF));
    let backend = attach(&logger, MemoryBackend::full("mem"));

    for i in 0..10 {
        test_log!(logger, LogLevel::Info, "OVF", "{}", i);
    }
    logger.flush();
    backend.clear();

    test_log!(logger, LogLevel::Info, "OVF", "after overflow");
    logger.flush();
    kassert!(backend.text_lines() == ["I/OVF: after overflow\r\n"]);
});
