//! vent 过程宏
//!
//! - `#[derive(Event)]`：声明事件层级（根事件持有 header，子事件组合父事件）
//! - `#[listener]`：在编译期扫描监听器的处理方法，生成 `Listener::discover`
//!
use proc_macro::TokenStream;

mod event;
mod listener;
mod utils;

/// 事件派生宏
///
/// 根事件用 `#[event(header)]` 标注持有 `EventHeader` 的字段；
/// 子事件用 `#[event(parent)]` 标注被组合的父事件字段。
///
/// ```ignore
/// #[derive(Event)]
/// struct Connected {
///     #[event(header)]
///     header: EventHeader,
/// }
///
/// #[derive(Event)]
/// struct Reconnected {
///     #[event(parent)]
///     base: Connected,
///     attempts: u32,
/// }
/// ```
#[proc_macro_derive(Event, attributes(event))]
pub fn derive_event(input: TokenStream) -> TokenStream {
    event::expand(input)
}

/// 监听器宏
///
/// 作用于固有 impl 块，可选参数 `key = "..."`。方法属性：
/// - `#[subscribe(priority = High, process_cancelled, result_processors = ["k"])]`：
///   事件处理器，参数为 `&mut E` 或 `&E`；
/// - `#[disabled]` / `#[disabled(until = "...")]`：不参与分发，仅记录；
/// - `#[extend(identifier = "k", result_processors = [...])]`：扩展器，参数为 `&T`。
///
/// 返回 `Result` 的方法中，`Err` 会作为调用失败记录日志。
#[proc_macro_attribute]
pub fn listener(attr: TokenStream, item: TokenStream) -> TokenStream {
    listener::expand(attr, item)
}
