/// 定义一个标准的测试用例。
///
/// 语法：`test_case!(test_name, { code });`
/// 展开为宿主机测试框架的 `#[test]` 函数。
macro_rules! test_case {
    ($func_name:ident, $body:block) => {
        #[doc = concat!("Test case: ", stringify!($func_name))]
        #[test]
        fn $func_name() {
            std::println!(
                "\x1b[33mRunning test: {}::{}\x1b[0m",
                module_path!(),
                stringify!($func_name)
            );
            $body
        }
    };
}

/// 判断条件是否为真，如果为假则让当前测试失败并打印条件与位置。
macro_rules! kassert {
    ($cond:expr) => {{
        if !$cond {
            panic!(
                "\x1b[31mFailed assertion: {} at {}:{}\x1b[0m",
                stringify!($cond),
                file!(),
                line!()
            );
        }
    }};
}
