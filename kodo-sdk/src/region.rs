//! 各存储区域的服务域名

use std::fmt::{Display, Formatter};

/// 需要访问的服务
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    /// 资源管理（stat、batch等）
    Rs,
    /// 资源列举
    Rsf,
    /// 域名等api
    Api,
    /// bucket管理
    Uc,
    /// 直播
    Pili,
}

pub trait EndpointResolver: Send + Sync {
    /// 返回不带`/`结尾的base url，例如`https://rs-z0.qiniuapi.com`
    fn resolve(&self, kind: ServiceKind, https: bool) -> String;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Region {
    /// 华东
    Z0,
    /// 华北
    Z1,
    /// 华南
    Z2,
    /// 北美
    Na0,
    /// 东南亚
    As0,
    /// 私有部署等自定义域名，值为不带scheme的host
    Custom {
        rs: String,
        rsf: String,
        api: String,
        uc: String,
        pili: String,
    },
}

impl Region {
    fn id(&self) -> Option<&'static str> {
        match self {
            Region::Z0 => Some("z0"),
            Region::Z1 => Some("z1"),
            Region::Z2 => Some("z2"),
            Region::Na0 => Some("na0"),
            Region::As0 => Some("as0"),
            Region::Custom { .. } => None,
        }
    }

    pub fn host(&self, kind: ServiceKind) -> String {
        if let Region::Custom {
            rs,
            rsf,
            api,
            uc,
            pili,
        } = self
        {
            let h = match kind {
                ServiceKind::Rs => rs,
                ServiceKind::Rsf => rsf,
                ServiceKind::Api => api,
                ServiceKind::Uc => uc,
                ServiceKind::Pili => pili,
            };
            return h.clone();
        }

        // Custom已经在上面返回
        let id = self.id().unwrap_or("z0");
        match kind {
            ServiceKind::Rs => format!("rs-{}.qiniuapi.com", id),
            ServiceKind::Rsf => format!("rsf-{}.qiniuapi.com", id),
            ServiceKind::Api => format!("api-{}.qiniuapi.com", id),
            // uc和pili不区分区域
            ServiceKind::Uc => "uc.qiniuapi.com".to_owned(),
            ServiceKind::Pili => "pili.qiniuapi.com".to_owned(),
        }
    }
}

impl EndpointResolver for Region {
    fn resolve(&self, kind: ServiceKind, https: bool) -> String {
        let scheme = if https { "https" } else { "http" };
        format!("{}://{}", scheme, self.host(kind))
    }
}

impl Display for Region {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{id}"),
            None => write!(f, "custom"),
        }
    }
}
