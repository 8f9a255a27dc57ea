//! 输入模拟协作接口
//!
//! 鼠标移动动画、点击与拖拽的时序由具体驱动实现；引擎只负责提供元素的
//! 屏幕中心点。macOS 上的实现见 `CgEventInput`。

use super::element::Element;
use super::error::AxResult;
use super::platform::Accessibility;
use super::value::Point;
use std::time::Duration;
use tracing::debug;

pub trait InputDriver {
    /// 移动指针到屏幕坐标，`duration` 为移动动画时长
    fn move_to(&mut self, point: Point, duration: Duration) -> AxResult<()>;

    /// 在屏幕坐标处单击左键
    fn click(&mut self, point: Point) -> AxResult<()>;

    /// 按住左键从当前位置拖拽到屏幕坐标
    fn drag_to(&mut self, point: Point, duration: Duration) -> AxResult<()>;

    /// 输入文本；`target` 为接收键盘事件的进程，`None` 表示当前前台应用
    fn type_text(&mut self, text: &str, target: Option<i32>) -> AxResult<()>;
}

/// 移动指针到元素中心
pub fn move_to_element<A: Accessibility, D: InputDriver + ?Sized>(
    driver: &mut D,
    element: &Element<A>,
    duration: Duration,
) -> AxResult<Point> {
    let center = element.center()?;
    debug!("move_to_element: center=({:.0},{:.0})", center.x, center.y);
    driver.move_to(center, duration)?;
    Ok(center)
}

/// 点击元素中心
///
/// 用于 AXPress 对其无效的控件。
pub fn click_element<A: Accessibility, D: InputDriver + ?Sized>(
    driver: &mut D,
    element: &Element<A>,
) -> AxResult<Point> {
    let center = element.center()?;
    debug!("click_element: center=({:.0},{:.0})", center.x, center.y);
    driver.click(center)?;
    Ok(center)
}

/// 先以动画移动到元素中心再点击，模拟真实用户操作
pub fn move_and_click<A: Accessibility, D: InputDriver + ?Sized>(
    driver: &mut D,
    element: &Element<A>,
    duration: Duration,
) -> AxResult<Point> {
    let center = move_to_element(driver, element, duration)?;
    driver.click(center)?;
    Ok(center)
}

/// 从 `from` 的中心拖拽到 `to` 的中心
pub fn drag_element_to<A: Accessibility, D: InputDriver + ?Sized>(
    driver: &mut D,
    from: &Element<A>,
    to: &Element<A>,
    duration: Duration,
) -> AxResult<()> {
    let start = from.center()?;
    let end = to.center()?;
    driver.move_to(start, Duration::ZERO)?;
    driver.drag_to(end, duration)
}

/// 聚焦元素后向其所属进程输入文本
pub fn type_into<A: Accessibility, D: InputDriver + ?Sized>(
    driver: &mut D,
    element: &Element<A>,
    text: &str,
) -> AxResult<()> {
    if element.is_settable("AXFocused").unwrap_or(false) {
        element.set_attribute("AXFocused", true)?;
    }
    let pid = element.pid()?;
    driver.type_text(text, Some(pid))
}
