//! The prompt sent to every provider.
//!
//! One template, shared by all adapters, so switching provider never changes
//! what the model is asked to write.

/// Build the instruction prompt for one student.
///
/// Both fields are embedded verbatim.
pub fn build_prompt(student_name: &str, student_info: &str) -> String {
    format!(
        "你是一位经验丰富的班主任老师，请根据以下学生信息，生成一段真诚、具体、有温度的学生评语。

学生姓名：{student_name}
学生情况：{student_info}

要求：
1. 评语要真诚、具体，避免空洞的套话
2. 突出学生的优点和进步
3. 如果有不足，要委婉地提出改进建议
4. 语气要温暖、鼓励，体现对学生的关心
5. 字数控制在150-200字左右
6. 直接输出评语内容，不要有其他说明

请生成评语："
    )
}
