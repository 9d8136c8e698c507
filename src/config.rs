// Copyright (c) 2026 shaneyale (shaneyale86@gmail.com)
// All rights reserved.

use std::{
    fs,
    net::{Ipv4Addr, SocketAddrV4},
    path::Path,
};

use log::warn;
use serde_derive::{Deserialize, Serialize};

use crate::exception::Exception;

/// 服务运行参数，从 TOML 文件加载。缺省的键使用默认值。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    #[serde(default = "default_port")]
    port: u16,
    /// 为 `true` 时只监听 127.0.0.1，否则监听 0.0.0.0
    #[serde(default = "default_true")]
    local: bool,
    /// 0 表示使用 CPU 核心数
    #[serde(default)]
    worker_threads: usize,
    #[serde(default = "default_max_request_size")]
    max_request_size: usize,
    #[serde(default = "default_read_timeout_secs")]
    read_timeout_secs: u64,
    #[serde(default = "default_true")]
    enable_compression: bool,
    #[serde(default = "default_true")]
    access_log: bool,
}

fn default_port() -> u16 {
    7878
}

fn default_true() -> bool {
    true
}

fn default_max_request_size() -> usize {
    1048576 // 1MB
}

fn default_read_timeout_secs() -> u64 {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            local: true,
            worker_threads: num_cpus::get(),
            max_request_size: default_max_request_size(),
            read_timeout_secs: default_read_timeout_secs(),
            enable_compression: true,
            access_log: true,
        }
    }
}

impl Config {
    pub fn from_toml(filename: impl AsRef<Path>) -> Result<Self, Exception> {
        let filename = filename.as_ref();
        let raw = fs::read_to_string(filename)
            .map_err(|e| Exception::Config(format!("无法读取 {}：{}", filename.display(), e)))?;
        Self::parse(&raw)
    }

    /// 从 TOML 文本解析配置并修正非法取值
    pub fn parse(raw: &str) -> Result<Self, Exception> {
        let mut config: Config =
            toml::from_str(raw).map_err(|e| Exception::Config(e.to_string()))?;
        if config.worker_threads == 0 {
            config.worker_threads = num_cpus::get();
        }
        if config.max_request_size == 0 {
            warn!("max_request_size被设置为0，将使用默认值{}", default_max_request_size());
            config.max_request_size = default_max_request_size();
        }
        if config.read_timeout_secs == 0 {
            warn!("read_timeout_secs被设置为0，将使用默认值{}", default_read_timeout_secs());
            config.read_timeout_secs = default_read_timeout_secs();
        }
        Ok(config)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_max_request_size(mut self, size: usize) -> Self {
        self.max_request_size = size;
        self
    }

    pub fn with_compression(mut self, enable: bool) -> Self {
        self.enable_compression = enable;
        self
    }

    /// 根据 `local` 与 `port` 得到监听地址
    pub fn socket_addr(&self) -> SocketAddrV4 {
        let address = match self.local {
            true => Ipv4Addr::new(127, 0, 0, 1),
            false => Ipv4Addr::new(0, 0, 0, 0),
        };
        SocketAddrV4::new(address, self.port)
    }
}

impl Config {
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn local(&self) -> bool {
        self.local
    }

    pub fn worker_threads(&self) -> usize {
        self.worker_threads
    }

    pub fn max_request_size(&self) -> usize {
        self.max_request_size
    }

    pub fn read_timeout_secs(&self) -> u64 {
        self.read_timeout_secs
    }

    pub fn enable_compression(&self) -> bool {
        self.enable_compression
    }

    pub fn access_log(&self) -> bool {
        self.access_log
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "port = 8081\nlocal = false\nworker_threads = 2\nmax_request_size = 4096\nenable_compression = false"
        )
        .unwrap();

        let config = Config::from_toml(file.path()).unwrap();
        assert_eq!(config.port(), 8081);
        assert!(!config.local());
        assert_eq!(config.worker_threads(), 2);
        assert_eq!(config.max_request_size(), 4096);
        assert!(!config.enable_compression());
        assert!(config.access_log());
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8081");
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.port(), 7878);
        assert!(config.local());
        assert_eq!(config.worker_threads(), num_cpus::get());
        assert_eq!(config.max_request_size(), 1048576);
        assert_eq!(config.read_timeout_secs(), 5);
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_values_are_corrected() {
        let config = Config::parse("max_request_size = 0\nread_timeout_secs = 0").unwrap();
        assert_eq!(config.max_request_size(), 1048576);
        assert_eq!(config.read_timeout_secs(), 5);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(matches!(Config::parse("port = \"abc\""), Err(Exception::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::from_toml(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(Exception::Config(_))));
    }
}
