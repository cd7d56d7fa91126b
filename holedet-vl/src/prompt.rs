//! Instruction prompt for hole detection.

/// User prompt paired with every training image and used at inference time.
///
/// The leading `<image>` tag marks where the training framework splices in
/// the image tokens.
pub const DETECTION_PROMPT: &str = r#"<image>
任务：
在输入图纸或零件图像中，定位并分类所有孔实例，输出 JSON 列表。

1. 待检测类别（4 类）
  1.1 圆孔  (circle_hole)
  1.2 腰孔  (slot_hole)
  1.3 螺纹孔(thread_hole)
  1.4 矩形孔(rect_hole)

2. 几何定义与尺寸参数提取规则
  2.1 圆孔
      - 轮廓：闭合圆
      - 尺寸参数 D：直径，单位 mm，例 18 → "18mm"
  2.2 腰孔
      - 轮廓：形似椭圆，两平行直边 + 两对称半圆弧
      - 尺寸参数 W×L：直边间距 W，两圆弧中心距 L，单位 mm，例 14×30 → "14*30mm"
  2.3 螺纹孔
      - 轮廓：闭合圆（可见螺纹线且尺寸参数一定带有英文字母M）
      - 尺寸参数 M：标称直径，单位 mm，例 M18 → "18mm"
  2.4 矩形孔
      - 轮廓：四边形（含正方形）
      - 尺寸参数
        ‑ 正方形：边长 A，单位 mm，例 18 → "18mm"
        ‑ 长方形：长边x短边 LxW，单位 mm，例 20x14 → "20*14mm"

3. 输出格式（严格 JSON 列表，每对象字段如下）
  [
    {
      "category": "<类别中文标识>",
      "bbox": [x_min, y_min, x_max, y_max],   // 像素坐标，整数
      "size" : "<尺寸参数字符串>"
    },
    ...
  ]

4. 补充规则
  - 所有孔必须闭合可见。
  - 图纸中孔尺寸参数可能记录为N x size,N 表示同类型尺寸的孔的个数，请注意区分。
  - 无置信度阈值要求，但不得重复框。

请按以上指令执行检测并直接返回 JSON，勿附加解释。"#;

/// Loads a prompt override from disk, falling back to [`DETECTION_PROMPT`].
pub fn load_prompt(path: Option<&std::path::Path>) -> std::io::Result<String> {
    match path {
        Some(p) => std::fs::read_to_string(p),
        None => Ok(DETECTION_PROMPT.to_string()),
    }
}
