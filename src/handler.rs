//! # 处理函数与参数绑定
//!
//! 处理函数在注册时就被归入两种形态之一，之后每个请求不再检查其签名：
//! - [`Handler::Contextual`]：第一个参数是 `&mut Context`，其后是字符串捕获组；
//! - [`Handler::Plain`]：只接收字符串捕获组。
//!
//! 任意 `Fn(String, ...)` 或 `Fn(&mut Context, String, ...)`（最多 6 个捕获）
//! 都通过 [`IntoHandler`] 自动转换。捕获组数量与参数个数不一致时，
//! 在调用时返回 [`DispatchFault::ArgumentMismatch`]。

use crate::{context::Context, exception::DispatchFault};

use bytes::Bytes;
use log::debug;
use std::any::Any;

type PlainFn = dyn Fn(Vec<String>) -> Result<Reply, DispatchFault> + Send + Sync;
type ContextualFn = dyn Fn(&mut Context, Vec<String>) -> Result<Reply, DispatchFault> + Send + Sync;

/// 已确定形态的处理函数。
pub enum Handler {
    Plain(Box<PlainFn>),
    Contextual(Box<ContextualFn>),
}

/// 绑定好的调用参数。
pub enum Arguments<'a> {
    Captures(Vec<String>),
    WithContext(&'a mut Context, Vec<String>),
}

impl Handler {
    /// 以切片形式接收全部捕获组的普通处理函数，不限捕获数量。
    pub fn plain_slice<F, R>(f: F) -> Self
    where
        F: Fn(&[String]) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Handler::Plain(Box::new(
            move |captures: Vec<String>| -> Result<Reply, DispatchFault> {
                Ok(f(&captures).into_reply())
            },
        ))
    }

    /// 以切片形式接收全部捕获组、并需要请求上下文的处理函数。
    pub fn contextual_slice<F, R>(f: F) -> Self
    where
        F: Fn(&mut Context, &[String]) -> R + Send + Sync + 'static,
        R: IntoReply,
    {
        Handler::Contextual(Box::new(
            move |ctx: &mut Context, captures: Vec<String>| -> Result<Reply, DispatchFault> {
                Ok(f(ctx, &captures).into_reply())
            },
        ))
    }

    pub fn requires_context(&self) -> bool {
        matches!(self, Handler::Contextual(_))
    }

    /// 组装调用参数：需要上下文时把它放在最前，捕获组按从左到右的顺序跟随。
    pub fn bind<'a>(&self, captures: Vec<String>, ctx: &'a mut Context) -> Arguments<'a> {
        match self {
            Handler::Contextual(_) => Arguments::WithContext(ctx, captures),
            Handler::Plain(_) => Arguments::Captures(captures),
        }
    }

    pub fn call(&self, args: Arguments<'_>) -> Result<Reply, DispatchFault> {
        match (self, args) {
            (Handler::Plain(f), Arguments::Captures(captures))
            | (Handler::Plain(f), Arguments::WithContext(_, captures)) => f(captures),
            (Handler::Contextual(f), Arguments::WithContext(ctx, captures)) => f(ctx, captures),
            (Handler::Contextual(_), Arguments::Captures(captures)) => {
                Err(DispatchFault::ArgumentMismatch {
                    expected: captures.len() + 1,
                    found: captures.len(),
                })
            }
        }
    }
}

/// 不需要上下文、接收 `N` 个捕获组的处理函数标记。
pub struct Plain<const N: usize>;

/// 第一个参数为 `&mut Context`、其后接收 `N` 个捕获组的处理函数标记。
pub struct WithContext<const N: usize>;

/// 可以注册为路由处理函数的类型。`M` 只用于区分不同签名。
pub trait IntoHandler<M> {
    fn into_handler(self) -> Handler;
}

impl IntoHandler<Handler> for Handler {
    fn into_handler(self) -> Handler {
        self
    }
}

fn expect_captures<const N: usize>(captures: Vec<String>) -> Result<[String; N], DispatchFault> {
    let found = captures.len();
    captures
        .try_into()
        .map_err(|_| DispatchFault::ArgumentMismatch { expected: N, found })
}

macro_rules! impl_into_handler {
    ($count:literal $(, $cap:ident: $ty:ty)*) => {
        impl<F, R> IntoHandler<Plain<$count>> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: IntoReply,
        {
            fn into_handler(self) -> Handler {
                Handler::Plain(Box::new(move |captures: Vec<String>| -> Result<Reply, DispatchFault> {
                    let [$($cap),*] = expect_captures::<$count>(captures)?;
                    Ok(self($($cap),*).into_reply())
                }))
            }
        }

        impl<F, R> IntoHandler<WithContext<$count>> for F
        where
            F: Fn(&mut Context $(, $ty)*) -> R + Send + Sync + 'static,
            R: IntoReply,
        {
            fn into_handler(self) -> Handler {
                Handler::Contextual(Box::new(move |ctx: &mut Context, captures: Vec<String>| -> Result<Reply, DispatchFault> {
                    let [$($cap),*] = expect_captures::<$count>(captures)?;
                    Ok(self(ctx $(, $cap)*).into_reply())
                }))
            }
        }
    };
}

impl_into_handler!(0);
impl_into_handler!(1, a: String);
impl_into_handler!(2, a: String, b: String);
impl_into_handler!(3, a: String, b: String, c: String);
impl_into_handler!(4, a: String, b: String, c: String, d: String);
impl_into_handler!(5, a: String, b: String, c: String, d: String, e: String);
impl_into_handler!(6, a: String, b: String, c: String, d: String, e: String, f: String);

/// 处理函数的返回值。
pub enum Reply {
    /// 没有返回值：处理函数已经通过上下文自行写出响应。
    Nothing,
    Text(String),
    Bytes(Bytes),
    /// 其它任意类型的返回值，写出时被当作空正文。
    Other(Box<dyn Any + Send>),
}

impl Reply {
    pub fn other<T: Any + Send>(value: T) -> Self {
        Reply::Other(Box::new(value))
    }

    /// 把返回值转换为要写出的正文。
    ///
    /// `None` 表示不应再写任何内容；文本按 UTF-8 编码，字节原样透传，
    /// 其它类型得到空正文且不报错。
    pub fn into_payload(self) -> Option<Bytes> {
        match self {
            Reply::Nothing => None,
            Reply::Text(text) => Some(Bytes::from(text)),
            Reply::Bytes(bytes) => Some(bytes),
            Reply::Other(_) => {
                debug!("处理函数返回了无法写出的类型，使用空正文");
                Some(Bytes::new())
            }
        }
    }
}

pub trait IntoReply {
    fn into_reply(self) -> Reply;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Reply {
        self
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Reply {
        Reply::Nothing
    }
}

impl IntoReply for String {
    fn into_reply(self) -> Reply {
        Reply::Text(self)
    }
}

impl IntoReply for &'static str {
    fn into_reply(self) -> Reply {
        Reply::Text(self.to_string())
    }
}

impl IntoReply for Vec<u8> {
    fn into_reply(self) -> Reply {
        Reply::Bytes(Bytes::from(self))
    }
}

impl IntoReply for Bytes {
    fn into_reply(self) -> Reply {
        Reply::Bytes(self)
    }
}
