//! Shell command glue
//!
//! Each command takes the shell's argument vector (`argv[0]` is the command
//! name) and a sink for its human-readable output. Options follow the
//! getopt string `t:sgdl:k:`:
//!
//! | option | meaning |
//! |---|---|
//! | `-s` / `-g` / `-d` | set / get / delete |
//! | `-l <0..7>` | level |
//! | `-t <tag>` | tag name |
//! | `-k <keyword>` | keyword |
//!
//! On failure the command's help text is printed and an error returned.

use core::fmt::{self, Write};

use crate::error::{DlogError, DlogResult};
use crate::log::filter::{FilterKeyword, FilterTag};
use crate::log::{LogLevel, Logger};
use crate::platform::Platform;

const LEVEL_HELP: &str =
    "                level: 0-emerg, 1-alert, 2-crit, 3-error, 4-warning, 5-notice, 6-info, 7-debug\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Set,
    Get,
    Delete,
}

#[derive(Debug, Default)]
struct CtrlOptions<'a> {
    action: Option<Action>,
    level: Option<&'a str>,
    tag: Option<&'a str>,
    keyword: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptError {
    /// 未知选项
    BadOption(char),
    /// 选项缺少参数
    MissingArgument(char),
}

impl fmt::Display for OptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptError::BadOption(c) => write!(f, "Invalid option: {}", c),
            OptError::MissingArgument(c) => write!(f, "Option -{} requires an argument", c),
        }
    }
}

/// 解析 `t:sgdl:k:`；遇到第一个非选项参数时停止
fn parse_options<'a>(argv: &[&'a str]) -> Result<CtrlOptions<'a>, OptError> {
    let mut opts = CtrlOptions::default();
    let mut args = argv.iter().skip(1);

    while let Some(&arg) = args.next() {
        let Some(cluster) = arg.strip_prefix('-').filter(|c| !c.is_empty()) else {
            break;
        };

        for (idx, opt) in cluster.char_indices() {
            match opt {
                's' => opts.action = Some(Action::Set),
                'g' => opts.action = Some(Action::Get),
                'd' => opts.action = Some(Action::Delete),
                'l' | 't' | 'k' => {
                    // 参数可以紧跟在选项后面，也可以是下一个 argv
                    let rest = &cluster[idx + opt.len_utf8()..];
                    let value = if rest.is_empty() {
                        *args.next().ok_or(OptError::MissingArgument(opt))?
                    } else {
                        rest
                    };
                    match opt {
                        'l' => opts.level = Some(value),
                        't' => opts.tag = Some(value),
                        _ => opts.keyword = Some(value),
                    }
                    break;
                }
                other => return Err(OptError::BadOption(other)),
            }
        }
    }
    Ok(opts)
}

fn parse_level(value: &str) -> Option<LogLevel> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(|v| LogLevel::try_from(v).ok())
}

fn get_options<'a>(argv: &[&'a str], out: &mut dyn Write) -> DlogResult<CtrlOptions<'a>> {
    parse_options(argv).map_err(|e| {
        let _ = write!(out, "{}\r\nGet option failed!\r\n", e);
        DlogError::InvalidArgument
    })
}

fn level_option(opts: &CtrlOptions<'_>, what: &str, out: &mut dyn Write) -> DlogResult<LogLevel> {
    let Some(raw) = opts.level else {
        let _ = write!(out, "No {} level option\r\n", what);
        return Err(DlogError::InvalidArgument);
    };
    parse_level(raw).ok_or_else(|| {
        let _ = write!(out, "Invalid {} level({})\r\n", what, raw);
        DlogError::InvalidArgument
    })
}

fn with_help(
    out: &mut dyn Write,
    help: fn(&mut dyn Write),
    f: impl FnOnce(&mut dyn Write) -> DlogResult<()>,
) -> DlogResult<()> {
    let ret = f(&mut *out);
    if ret.is_err() {
        help(out);
    }
    ret
}

fn glvl_help(out: &mut dyn Write) {
    let _ = out.write_str("Command format:\r\n");
    let _ = out.write_str("dlog_glvl_ctrl <-s | -g> [-l global level]\r\n");
    let _ = out.write_str("parameter Usage:\r\n");
    let _ = out.write_str("         -s     Set global level option.\r\n");
    let _ = out.write_str("         -g     Get global level option.\r\n");
    let _ = out.write_str("         -l     Specify a global level that want to be set.\r\n");
    let _ = out.write_str(LEVEL_HELP);
}

/// `dlog_glvl_ctrl <-s | -g> [-l level]`
pub fn dlog_glvl_ctrl<P: Platform>(
    logger: &Logger<P>,
    argv: &[&str],
    out: &mut dyn Write,
) -> DlogResult<()> {
    with_help(out, glvl_help, |out| {
        let opts = get_options(argv, out)?;
        match opts.action {
            Some(Action::Get) => {
                let _ = write!(out, "Global level is: {}\r\n", logger.global_level().name());
                Ok(())
            }
            Some(Action::Set) => {
                let level = level_option(&opts, "global", out)?;
                logger.set_global_level(level)?;
                let _ = write!(out, "Set global level({}) success!\r\n", level.name());
                Ok(())
            }
            _ => {
                let _ = out.write_str("No command option, please input -s or -g.\r\n");
                Err(DlogError::InvalidArgument)
            }
        }
    })
}

fn tlvl_help(out: &mut dyn Write) {
    let _ = out.write_str("Command format:\r\n");
    let _ = out.write_str("dlog_tlvl_ctrl <-s | -g | -d> <-t tag name> [-l tag level]\r\n");
    let _ = out.write_str("parameter Usage:\r\n");
    let _ = out.write_str("         -s     Set tag level option.\r\n");
    let _ = out.write_str("         -g     Get tag level option.\r\n");
    let _ = out.write_str("         -d     Delete tag level option.\r\n");
    let _ = out.write_str("         -t     Specify the tag name that want set level.\r\n");
    let _ = out.write_str("         -l     Specify a tag level that want to be set.\r\n");
    let _ = out.write_str(LEVEL_HELP);
}

/// `dlog_tlvl_ctrl <-s | -g | -d> <-t tag> [-l level]`
pub fn dlog_tlvl_ctrl<P: Platform>(
    logger: &Logger<P>,
    argv: &[&str],
    out: &mut dyn Write,
) -> DlogResult<()> {
    with_help(out, tlvl_help, |out| {
        let opts = get_options(argv, out)?;
        let tag = opts.tag.map(FilterTag::new).filter(|t| !t.is_empty());

        if opts.action.is_none() {
            let _ = out.write_str("No command option, please input -s, -g or -d!\r\n");
        }
        if tag.is_none() {
            let _ = out.write_str("No tag name option!\r\n");
        }
        let (Some(action), Some(tag)) = (opts.action, tag) else {
            return Err(DlogError::InvalidArgument);
        };

        match action {
            Action::Get => match logger.tag_level(tag.as_str()) {
                Ok(level) => {
                    let _ = write!(out, "The tag({}) level is: {}.\r\n", tag, level.name());
                    Ok(())
                }
                Err(e) => {
                    let _ = write!(out, "Not found tag({}), get tag level failed.\r\n", tag);
                    Err(e)
                }
            },
            Action::Set => {
                let level = level_option(&opts, "tag", out)?;
                let ret = logger.set_tag_level(tag.as_str(), level);
                let verdict = if ret.is_ok() { "success" } else { "failed" };
                let _ = write!(out, "Set tag {}, tag: {}, level: {}\r\n", verdict, tag, level.name());
                ret
            }
            Action::Delete => {
                let ret = logger.remove_tag_level(tag.as_str());
                let verdict = if ret.is_ok() { "success" } else { "failed" };
                let _ = write!(out, "Del tag({}) {}.\r\n", tag, verdict);
                ret
            }
        }
    })
}

fn gtag_help(out: &mut dyn Write) {
    let _ = out.write_str("Command format:\r\n");
    let _ = out.write_str("dlog_gtag_ctrl <-s | -g | -d> [-t tag name]\r\n");
    let _ = out.write_str("parameter Usage:\r\n");
    let _ = out.write_str("         -s     Set global tag option.\r\n");
    let _ = out.write_str("         -g     Get global tag option.\r\n");
    let _ = out.write_str("         -d     Delete global tag option.\r\n");
    let _ = out.write_str("         -t     Specify the global tag name.\r\n");
}

/// `dlog_gtag_ctrl <-s | -g | -d> [-t tag]`
pub fn dlog_gtag_ctrl<P: Platform>(
    logger: &Logger<P>,
    argv: &[&str],
    out: &mut dyn Write,
) -> DlogResult<()> {
    with_help(out, gtag_help, |out| {
        let opts = get_options(argv, out)?;
        match opts.action {
            Some(Action::Get) => {
                match logger.filter_tag()? {
                    Some(tag) => {
                        let _ = write!(out, "The global filter tag is {}\r\n", tag);
                    }
                    None => {
                        let _ = out.write_str("No global filter tag\r\n");
                    }
                }
                Ok(())
            }
            Some(Action::Set) => {
                let Some(tag) = opts.tag.map(FilterTag::new).filter(|t| !t.is_empty()) else {
                    let _ = out.write_str("No tag name option.\r\n");
                    return Err(DlogError::InvalidArgument);
                };
                logger.set_filter_tag(tag.as_str())?;
                let _ = write!(out, "Set global filter tag({}) success\r\n", tag);
                Ok(())
            }
            Some(Action::Delete) => {
                logger.clear_filter_tag()?;
                let _ = out.write_str("Del global filter tag success.\r\n");
                Ok(())
            }
            None => {
                let _ = out.write_str("Invalid command option, please input -s, -g or -d!\r\n");
                Err(DlogError::InvalidArgument)
            }
        }
    })
}

fn gkw_help(out: &mut dyn Write) {
    let _ = out.write_str("Command format:\r\n");
    let _ = out.write_str("dlog_gkw_ctrl <-s | -g | -d> [-k keyword]\r\n");
    let _ = out.write_str("parameter Usage:\r\n");
    let _ = out.write_str("         -s     Set global keyword option.\r\n");
    let _ = out.write_str("         -g     Get global keyword option.\r\n");
    let _ = out.write_str("         -d     Delete global keyword option.\r\n");
    let _ = out.write_str("         -k     Specify the global keyword.\r\n");
}

/// `dlog_gkw_ctrl <-s | -g | -d> [-k keyword]`
pub fn dlog_gkw_ctrl<P: Platform>(
    logger: &Logger<P>,
    argv: &[&str],
    out: &mut dyn Write,
) -> DlogResult<()> {
    with_help(out, gkw_help, |out| {
        let opts = get_options(argv, out)?;
        match opts.action {
            Some(Action::Get) => {
                match logger.filter_keyword()? {
                    Some(keyword) => {
                        let _ = write!(out, "The global filter keyword is {}\r\n", keyword);
                    }
                    None => {
                        let _ = out.write_str("No global filter keyword\r\n");
                    }
                }
                Ok(())
            }
            Some(Action::Set) => {
                let Some(keyword) = opts.keyword.map(FilterKeyword::new).filter(|k| !k.is_empty())
                else {
                    let _ = out.write_str("No keyword option.\r\n");
                    return Err(DlogError::InvalidArgument);
                };
                logger.set_filter_keyword(keyword.as_str())?;
                let _ = write!(out, "Set global filter keyword({}) success\r\n", keyword);
                Ok(())
            }
            Some(Action::Delete) => {
                logger.clear_filter_keyword()?;
                let _ = out.write_str("Del global filter keyword success.\r\n");
                Ok(())
            }
            None => {
                let _ = out.write_str("Invalid command option, please input -s, -g or -d!\r\n");
                Err(DlogError::InvalidArgument)
            }
        }
    })
}

/// `dlog_flush`
pub fn dlog_flush<P: Platform>(
    logger: &Logger<P>,
    _argv: &[&str],
    out: &mut dyn Write,
) -> DlogResult<()> {
    logger.flush();
    let _ = out.write_str("Flush dlog cache success!\r\n");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::string::String;

    use super::*;
    use crate::config::DlogConfig;
    use crate::test::{MockPlatform, new_logger};

    type Command = fn(&Logger<MockPlatform>, &[&str], &mut dyn Write) -> DlogResult<()>;

    fn run(cmd: Command, logger: &Logger<MockPlatform>, argv: &[&str]) -> (DlogResult<()>, String) {
        let mut out = String::new();
        let ret = cmd(logger, argv, &mut out);
        (ret, out)
    }

    test_case!(test_parse_clustered_and_separate_arguments, {
        let opts = parse_options(&["cmd", "-s", "-tNET", "-l", "6"]).unwrap();
        kassert!(opts.action == Some(Action::Set));
        kassert!(opts.tag == Some("NET"));
        kassert!(opts.level == Some("6"));

        let opts = parse_options(&["cmd", "-gk", "timeout"]).unwrap();
        kassert!(opts.action == Some(Action::Get));
        kassert!(opts.keyword == Some("timeout"));

        kassert!(parse_options(&["cmd", "-x"]).unwrap_err() == OptError::BadOption('x'));
        kassert!(parse_options(&["cmd", "-l"]).unwrap_err() == OptError::MissingArgument('l'));
    });

    test_case!(test_global_level_commands, {
        let logger = new_logger(DlogConfig::new());

        let (ret, out) = run(dlog_glvl_ctrl, &logger, &["dlog_glvl_ctrl", "-s", "-l", "7"]);
        kassert!(ret.is_ok());
        kassert!(out == "Set global level(debug) success!\r\n");
        kassert!(logger.global_level() == LogLevel::Debug);

        let (_, out) = run(dlog_glvl_ctrl, &logger, &["dlog_glvl_ctrl", "-g"]);
        kassert!(out == "Global level is: debug\r\n");
    });

    test_case!(test_invalid_level_prints_help, {
        let logger = new_logger(DlogConfig::new());
        let (ret, out) = run(dlog_glvl_ctrl, &logger, &["dlog_glvl_ctrl", "-s", "-l", "9"]);
        kassert!(ret == Err(DlogError::InvalidArgument));
        kassert!(out.starts_with("Invalid global level(9)\r\nCommand format:\r\n"));
        kassert!(logger.global_level() == LogLevel::Warning);

        let (ret, out) = run(dlog_glvl_ctrl, &logger, &["dlog_glvl_ctrl"]);
        kassert!(ret.is_err());
        kassert!(out.starts_with("No command option, please input -s or -g.\r\n"));
    });

    test_case!(test_tag_level_commands, {
        let logger = new_logger(DlogConfig::new());

        let (ret, out) = run(dlog_tlvl_ctrl, &logger, &["dlog_tlvl_ctrl", "-s", "-t", "NET", "-l", "6"]);
        kassert!(ret.is_ok());
        kassert!(out == "Set tag success, tag: NET, level: info\r\n");

        let (_, out) = run(dlog_tlvl_ctrl, &logger, &["dlog_tlvl_ctrl", "-g", "-t", "NET"]);
        kassert!(out == "The tag(NET) level is: info.\r\n");

        let (ret, out) = run(dlog_tlvl_ctrl, &logger, &["dlog_tlvl_ctrl", "-d", "-t", "NET"]);
        kassert!(ret.is_ok());
        kassert!(out == "Del tag(NET) success.\r\n");

        let (ret, out) = run(dlog_tlvl_ctrl, &logger, &["dlog_tlvl_ctrl", "-g", "-t", "NET"]);
        kassert!(ret == Err(DlogError::NotFound));
        kassert!(out.starts_with("Not found tag(NET), get tag level failed.\r\n"));
    });

    test_case!(test_tag_level_requires_action_and_tag, {
        let logger = new_logger(DlogConfig::new());
        let (ret, out) = run(dlog_tlvl_ctrl, &logger, &["dlog_tlvl_ctrl"]);
        kassert!(ret == Err(DlogError::InvalidArgument));
        kassert!(out.starts_with("No command option, please input -s, -g or -d!\r\nNo tag name option!\r\n"));
    });

    test_case!(test_global_tag_and_keyword_commands, {
        let logger = new_logger(DlogConfig::new());

        let (_, out) = run(dlog_gtag_ctrl, &logger, &["dlog_gtag_ctrl", "-g"]);
        kassert!(out == "No global filter tag\r\n");

        let (ret, out) = run(dlog_gtag_ctrl, &logger, &["dlog_gtag_ctrl", "-s", "-t", "NET"]);
        kassert!(ret.is_ok());
        kassert!(out == "Set global filter tag(NET) success\r\n");
        kassert!(logger.filter_tag().unwrap().unwrap().as_str() == "NET");

        let (_, out) = run(dlog_gtag_ctrl, &logger, &["dlog_gtag_ctrl", "-d"]);
        kassert!(out == "Del global filter tag success.\r\n");
        kassert!(logger.filter_tag().unwrap().is_none());

        let (ret, out) = run(dlog_gkw_ctrl, &logger, &["dlog_gkw_ctrl", "-s", "-k", "timeout"]);
        kassert!(ret.is_ok());
        kassert!(out == "Set global filter keyword(timeout) success\r\n");

        let (_, out) = run(dlog_gkw_ctrl, &logger, &["dlog_gkw_ctrl", "-g"]);
        kassert!(out == "The global filter keyword is timeout\r\n");

        let (ret, _) = run(dlog_gkw_ctrl, &logger, &["dlog_gkw_ctrl", "-s"]);
        kassert!(ret == Err(DlogError::InvalidArgument));
    });

    test_case!(test_flush_command, {
        let logger = new_logger(DlogConfig::new());
        let (ret, out) = run(dlog_flush, &logger, &["dlog_flush"]);
        kassert!(ret.is_ok());
        kassert!(out == "Flush dlog cache success!\r\n");
    });
}
