//! 连接管理器生命周期集成测试。
//!
//! # 教案级注释概览
//! - **核心目标 (Why)**：以可手动推进的 [`ManualTimer`](spark_endpoint::ManualTimer) 与记录型传输工厂
//!   驱动 `ConnectionManager`，逐毫秒断言退避节律、缓冲重放顺序与停机排空行为；
//! - **结构说明 (How)**：
//!   - `support`：记录型工厂 / 连接 / 流、脚本化退避提供者、测试夹具；
//!   - `backoff`：地址轮转与退避会话的调用节律；
//!   - `dispatch`：`obtain_active_transport` 的返回种类、缓冲重放与过期事件；
//!   - `shutdown`：停机在各阶段的排空与恰好一次的终止通知；
//!   - `concurrency`：多线程调用方与事件、停机交错时的一致性；
//! - **前置条件 (What)**：全部场景不依赖真实 I/O 或墙钟时间，连接事件由测试显式触发。

mod dispatch;
mod shutdown;
mod support;
